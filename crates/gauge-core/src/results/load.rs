//! Loading and merging result files.
//!
//! Files are folded in input order. When two files report the same domain,
//! simulations are concatenated and tasks are merged by id with the first
//! occurrence kept.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::error::{AggregationError, AggregationResult};
use super::model::{MultiDomainResults, Results};
use crate::metrics::METRICS;
use crate::obs;

/// Domain name to its results.
pub type DomainResults = BTreeMap<String, Results>;

/// Load one file in either container shape.
///
/// The multi-domain shape is tried first. A single-domain file is keyed by
/// `info.environment_info.domain_name`.
pub fn load_simulation_file(path: &Path) -> AggregationResult<DomainResults> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            AggregationError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            AggregationError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let domains = match serde_json::from_str::<MultiDomainResults>(&text) {
        Ok(multi) => multi.domains,
        Err(multi_err) => match serde_json::from_str::<Results>(&text) {
            Ok(results) => {
                let mut domains = BTreeMap::new();
                domains.insert(results.domain_name().to_string(), results);
                domains
            }
            Err(single_err) => {
                return Err(AggregationError::Unrecognized {
                    path: path.to_path_buf(),
                    multi_domain: multi_err.to_string(),
                    single_domain: single_err.to_string(),
                })
            }
        },
    };

    METRICS.inc_files_loaded();
    let simulations = domains.values().map(|r| r.simulations.len()).sum();
    obs::emit_results_loaded(&path.display().to_string(), domains.len(), simulations);
    Ok(domains)
}

/// Fold `incoming` into `acc`.
///
/// Unseen domains are adopted as they are. Seen domains get every incoming
/// simulation appended and only the tasks whose id is not already present.
pub fn merge_domains(acc: &mut DomainResults, incoming: DomainResults) {
    for (domain, results) in incoming {
        match acc.get_mut(&domain) {
            Some(existing) => {
                existing.simulations.extend(results.simulations);
                let mut known: HashSet<String> =
                    existing.tasks.iter().map(|t| t.id.clone()).collect();
                for task in results.tasks {
                    if known.insert(task.id.clone()) {
                        existing.tasks.push(task);
                    } else {
                        debug!(domain = %domain, task_id = %task.id, "duplicate task dropped");
                    }
                }
                obs::emit_results_merged(&domain, existing.tasks.len(), existing.simulations.len());
            }
            None => {
                acc.insert(domain, results);
            }
        }
    }
}

/// Load and merge `paths` in order. The first failing file aborts.
pub fn load_simulations<P: AsRef<Path>>(paths: &[P]) -> AggregationResult<DomainResults> {
    let mut all = DomainResults::new();
    for path in paths {
        merge_domains(&mut all, load_simulation_file(path.as_ref())?);
    }
    Ok(all)
}

/// Like [`load_simulations`], but files are read and parsed concurrently.
///
/// Parsed files are re-ordered by input position before folding, so the
/// output is identical to the sequential loader.
pub async fn load_simulations_concurrent(paths: &[PathBuf]) -> AggregationResult<DomainResults> {
    let mut join_set = JoinSet::new();
    for (idx, path) in paths.iter().cloned().enumerate() {
        join_set.spawn_blocking(move || (idx, load_simulation_file(&path)));
    }

    let mut ordered: Vec<Option<AggregationResult<DomainResults>>> =
        (0..paths.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, loaded) = joined?;
        ordered[idx] = Some(loaded);
    }

    let mut all = DomainResults::new();
    for loaded in ordered.into_iter().flatten() {
        merge_domains(&mut all, loaded?);
    }
    Ok(all)
}

/// Outcome of a load that skips unreadable files.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub domains: DomainResults,
    pub failures: Vec<(PathBuf, AggregationError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load every file that can be loaded; record the rest.
pub fn load_simulations_lenient<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut report = LoadReport::default();
    for path in paths {
        let path = path.as_ref();
        match load_simulation_file(path) {
            Ok(domains) => merge_domains(&mut report.domains, domains),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping result file");
                report.failures.push((path.to_path_buf(), err));
            }
        }
    }
    report
}
