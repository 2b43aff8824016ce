//! On-disk layout shared by every bundled domain.
//!
//! Each domain owns `<data_dir>/<domain>/` holding `db.json` (the state seed,
//! wrapped as `{"state": {...}}`), `policy.md` and `tasks.json`.

use std::path::{Path, PathBuf};

use std::sync::Arc;

use gauge_core::toolkit::TableError;
use gauge_core::{EnvironmentFactory, ToolTable};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DomainError, DomainResult};

pub const DB_FILE: &str = "db.json";
pub const POLICY_FILE: &str = "policy.md";
pub const TASKS_FILE: &str = "tasks.json";

/// Data shipped with this crate.
pub fn bundled_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

pub fn domain_dir(data_dir: &Path, domain: &str) -> PathBuf {
    data_dir.join(domain)
}

#[derive(Deserialize)]
struct SeedFile<S> {
    state: S,
}

/// Read a state seed.
pub fn load_seed<S: DeserializeOwned>(path: &Path) -> DomainResult<S> {
    let text = std::fs::read_to_string(path).map_err(|source| DomainError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let seed: SeedFile<S> = serde_json::from_str(&text).map_err(|source| DomainError::Seed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded state seed");
    Ok(seed.state)
}

/// Read a policy document verbatim.
pub fn load_policy(path: &Path) -> DomainResult<String> {
    std::fs::read_to_string(path).map_err(|source| DomainError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a factory from `<data_dir>/<domain>/{db.json, policy.md}` and a table.
pub(crate) fn assemble<S>(
    domain: &str,
    data_dir: &Path,
    table: Result<ToolTable<S>, TableError>,
) -> DomainResult<EnvironmentFactory>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let table = table.map_err(|source| DomainError::Table {
        domain: domain.to_string(),
        source,
    })?;
    let dir = domain_dir(data_dir, domain);
    let seed: S = load_seed(&dir.join(DB_FILE))?;
    let policy = load_policy(&dir.join(POLICY_FILE))?;
    Ok(EnvironmentFactory::new(domain, policy, seed, Arc::new(table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Tiny {
        count: u32,
    }

    #[test]
    fn test_seed_is_unwrapped_from_state_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);
        std::fs::write(&path, r#"{"state": {"count": 3}}"#).unwrap();
        let seed: Tiny = load_seed(&path).unwrap();
        assert_eq!(seed, Tiny { count: 3 });
    }

    #[test]
    fn test_seed_without_state_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);
        std::fs::write(&path, r#"{"count": 3}"#).unwrap();
        let err = load_seed::<Tiny>(&path).unwrap_err();
        assert!(matches!(err, DomainError::Seed { .. }));
    }

    #[test]
    fn test_missing_policy_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_policy(&dir.path().join(POLICY_FILE)).unwrap_err();
        assert!(err.to_string().contains("policy.md"));
    }
}
