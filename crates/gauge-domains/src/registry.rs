//! Name-based lookup over the bundled domains.

use std::path::{Path, PathBuf};

use gauge_core::{EnvironmentFactory, TaskSet};
use tracing::info;

use crate::error::{DomainError, DomainResult};
use crate::seed::{domain_dir, TASKS_FILE};
use crate::{collab, infra_loadshed, mail_rag_phishing, output_handling};

type BuildFn = fn(&Path) -> DomainResult<EnvironmentFactory>;

/// One registered domain.
#[derive(Clone, Copy)]
pub struct DomainEntry {
    pub name: &'static str,
    pub summary: &'static str,
    build: BuildFn,
}

impl std::fmt::Debug for DomainEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DomainEntry {
    pub fn environment_factory(&self, data_dir: &Path) -> DomainResult<EnvironmentFactory> {
        (self.build)(data_dir)
    }

    pub fn task_set_path(&self, data_dir: &Path) -> PathBuf {
        domain_dir(data_dir, self.name).join(TASKS_FILE)
    }
}

pub const DOMAINS: &[DomainEntry] = &[
    DomainEntry {
        name: collab::DOMAIN,
        summary: "support ticket with a poisoned collaborator note",
        build: collab::environment_factory,
    },
    DomainEntry {
        name: infra_loadshed::DOMAIN,
        summary: "quota-capped cluster under load shedding",
        build: infra_loadshed::environment_factory,
    },
    DomainEntry {
        name: output_handling::DOMAIN,
        summary: "raw versus sanitized snippets in customer replies",
        build: output_handling::environment_factory,
    },
    DomainEntry {
        name: mail_rag_phishing::DOMAIN,
        summary: "mail assistant over a poisoned retrieval index",
        build: mail_rag_phishing::environment_factory,
    },
];

pub fn domain_names() -> Vec<&'static str> {
    DOMAINS.iter().map(|d| d.name).collect()
}

pub fn lookup(name: &str) -> DomainResult<&'static DomainEntry> {
    DOMAINS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| DomainError::UnknownDomain {
            name: name.to_string(),
            known: domain_names().join(", "),
        })
}

pub fn environment_factory(name: &str, data_dir: &Path) -> DomainResult<EnvironmentFactory> {
    lookup(name)?.environment_factory(data_dir)
}

/// Load a domain's task set and check every reference against its toolkit.
pub fn load_tasks(name: &str, data_dir: &Path) -> DomainResult<TaskSet> {
    let entry = lookup(name)?;
    let factory = entry.environment_factory(data_dir)?;
    let env = factory.instantiate();
    let tasks = TaskSet::load(&entry.task_set_path(data_dir), env.toolkit())?;
    info!(domain = name, tasks = tasks.len(), "domain tasks ready");
    Ok(tasks)
}
