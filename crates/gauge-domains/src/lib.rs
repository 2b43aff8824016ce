//! Bundled evaluation domains.
//!
//! Each domain module exposes its state type, a `table()` of tagged tools
//! and assertion predicates, and an `environment_factory(data_dir)` that
//! reads `<data_dir>/<domain>/{db.json, policy.md}`. The [`registry`] maps
//! domain names to those factories and loads validated task sets.

pub mod collab;
pub mod error;
pub mod infra_loadshed;
pub mod mail_rag_phishing;
pub mod output_handling;
pub mod registry;
pub mod seed;

pub use error::{DomainError, DomainResult};
pub use registry::{domain_names, environment_factory, load_tasks, lookup, DomainEntry, DOMAINS};
pub use seed::bundled_data_dir;
