//! Errors raised while assembling a bundled domain.

use std::path::PathBuf;

use gauge_core::toolkit::TableError;
use gauge_core::TaskLoadError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("unknown domain '{name}' (known: {known})")]
    UnknownDomain { name: String, known: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state seed {path} is invalid: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool table for {domain} is malformed: {source}")]
    Table {
        domain: String,
        #[source]
        source: TableError,
    },

    #[error(transparent)]
    Tasks(#[from] TaskLoadError),
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
