//! Errors for loading result files and computing metrics.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("result file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither container shape matched; both parse errors are kept.
    #[error(
        "unrecognized result file {path}: not multi-domain ({multi_domain}); not single-domain ({single_domain})"
    )]
    Unrecognized {
        path: PathBuf,
        multi_domain: String,
        single_domain: String,
    },

    #[error("result loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type AggregationResult<T> = std::result::Result<T, AggregationError>;

/// Invalid arguments to the pass^k estimator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("pass^k requires k >= 1")]
    ZeroK,

    #[error("pass^{k} undefined for {n} trials")]
    KExceedsTrials { n: u64, k: u64 },

    #[error("{c} successes out of {n} trials is impossible")]
    SuccessesExceedTrials { n: u64, c: u64 },
}
