//! Harness configuration from defaults and `GAUGE_*` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rewards at or above this count as success.
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 1.0 - 1e-6;
/// Largest `k` reported for pass^k.
pub const DEFAULT_MAX_PASS_K: u32 = 4;
pub const DEFAULT_DATA_DIR: &str = "data";

/// Knobs used by the metrics aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub success_threshold: f64,
    pub max_pass_k: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            max_pass_k: DEFAULT_MAX_PASS_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Root holding `<domain>/{db.json, policy.md, tasks.json}`.
    pub data_dir: PathBuf,
    pub success_threshold: f64,
    pub max_pass_k: u32,
    pub log_json: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            max_pass_k: DEFAULT_MAX_PASS_K,
            log_json: false,
        }
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = %var, value = %raw, "ignoring unparsable setting");
            default
        }),
    }
}

impl HarnessConfig {
    /// Defaults overridden by `GAUGE_DATA_DIR`, `GAUGE_SUCCESS_THRESHOLD`,
    /// `GAUGE_MAX_PASS_K` and `GAUGE_LOG_FORMAT=json`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HarnessConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup("GAUGE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            success_threshold: parse_or(
                "GAUGE_SUCCESS_THRESHOLD",
                lookup("GAUGE_SUCCESS_THRESHOLD"),
                defaults.success_threshold,
            ),
            max_pass_k: parse_or(
                "GAUGE_MAX_PASS_K",
                lookup("GAUGE_MAX_PASS_K"),
                defaults.max_pass_k,
            ),
            log_json: lookup("GAUGE_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }

    pub fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            success_threshold: self.success_threshold,
            max_pass_k: self.max_pass_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = HarnessConfig::from_lookup(lookup(&[]));
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.aggregation(), AggregationConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("GAUGE_DATA_DIR", "/srv/gauge"),
            ("GAUGE_SUCCESS_THRESHOLD", "0.5"),
            ("GAUGE_MAX_PASS_K", "8"),
            ("GAUGE_LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/srv/gauge"));
        assert_eq!(config.success_threshold, 0.5);
        assert_eq!(config.max_pass_k, 8);
        assert!(config.log_json);
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let config = HarnessConfig::from_lookup(lookup(&[("GAUGE_MAX_PASS_K", "many")]));
        assert_eq!(config.max_pass_k, DEFAULT_MAX_PASS_K);
    }
}
