//! Process-wide counters for harness activity.
//!
//! Counters are bumped at the call site and reported together by
//! [`Metrics::flush`], typically once at the end of a CLI command.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counters.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    tool_calls: AtomicU64,
    tool_failures: AtomicU64,
    trials_evaluated: AtomicU64,
    files_loaded: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            tool_calls: AtomicU64::new(0),
            tool_failures: AtomicU64::new(0),
            trials_evaluated: AtomicU64::new(0),
            files_loaded: AtomicU64::new(0),
        }
    }

    pub fn inc_tool_calls(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tool_calls", "counter incremented");
    }

    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tool_failures", "counter incremented");
    }

    pub fn inc_trials_evaluated(&self) {
        self.trials_evaluated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "trials_evaluated", "counter incremented");
    }

    pub fn inc_files_loaded(&self) {
        self.files_loaded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "files_loaded", "counter incremented");
    }

    /// Emit every counter as one `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            tool_calls = self.tool_calls(),
            tool_failures = self.tool_failures(),
            trials_evaluated = self.trials_evaluated(),
            files_loaded = self.files_loaded(),
        );
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }

    pub fn tool_failures(&self) -> u64 {
        self.tool_failures.load(Ordering::Relaxed)
    }

    pub fn trials_evaluated(&self) -> u64 {
        self.trials_evaluated.load(Ordering::Relaxed)
    }

    pub fn files_loaded(&self) -> u64 {
        self.files_loaded.load(Ordering::Relaxed)
    }

    /// Zero all counters.
    pub fn reset(&self) {
        self.tool_calls.store(0, Ordering::Relaxed);
        self.tool_failures.store(0, Ordering::Relaxed);
        self.trials_evaluated.store(0, Ordering::Relaxed);
        self.files_loaded.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let m = Metrics::new();
        m.inc_tool_calls();
        m.inc_tool_calls();
        m.inc_tool_failures();
        m.inc_files_loaded();
        assert_eq!(m.tool_calls(), 2);
        assert_eq!(m.tool_failures(), 1);
        assert_eq!(m.trials_evaluated(), 0);
        assert_eq!(m.files_loaded(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_tool_calls();
        m.inc_trials_evaluated();
        m.reset();
        assert_eq!(m.tool_calls(), 0);
        assert_eq!(m.trials_evaluated(), 0);
    }
}
