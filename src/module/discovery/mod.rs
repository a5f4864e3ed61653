//! Module discovery sources and their aggregation.
//!
//! Each [`DiscoverySource`] produces module descriptors from one origin.
//! The [`DiscoveryManager`] runs all configured sources in a fixed priority
//! order (builtin, user, project, remote) and merges the results into one
//! deduplicated catalog. First-seen names win, so registration order is the
//! sole conflict-resolution mechanism: builtin modules can never be shadowed
//! by lower-trust sources.

mod builtin;
mod project;
mod remote;
mod user_dir;

pub use builtin::BuiltinSource;
pub use project::ProjectSource;
pub use remote::RemoteSource;
pub use user_dir::UserDirSource;

use std::collections::HashSet;

use async_trait::async_trait;

use super::{Module, ModuleResult};
use crate::core::ModulesConfig;

/// Trait for module discovery sources.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Origin kind, used for diagnostics and for stamping the `source`
    /// runtime field ("builtin", "user", "project", "remote").
    fn source_type(&self) -> &str;

    /// Discover modules from this origin.
    async fn discover(&self) -> ModuleResult<Vec<Module>>;
}

/// Aggregates all configured discovery sources.
pub struct DiscoveryManager {
    sources: Vec<Box<dyn DiscoverySource>>,
}

impl DiscoveryManager {
    /// Create a discovery manager with the standard source set.
    ///
    /// The remote source is added only when at least one repository is
    /// configured, so a zero-repository load performs no network I/O.
    pub fn new(config: &ModulesConfig) -> Self {
        let mut sources: Vec<Box<dyn DiscoverySource>> = vec![
            Box::new(BuiltinSource::new()),
            Box::new(UserDirSource::new(config)),
            Box::new(ProjectSource::new(config)),
        ];

        if !config.repositories.is_empty() {
            sources.push(Box::new(RemoteSource::new(config)));
        }

        Self { sources }
    }

    /// Create a manager from an explicit source list. The given order is
    /// the priority order.
    pub fn with_sources(sources: Vec<Box<dyn DiscoverySource>>) -> Self {
        Self { sources }
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Discover modules from all sources.
    ///
    /// Never fails: a failing source degrades to a warning and contributes
    /// zero modules. Duplicate names are dropped, first seen wins.
    pub async fn discover_all(&self) -> Vec<Module> {
        let mut all_modules = Vec::new();
        let mut seen = HashSet::new();

        for source in &self.sources {
            let modules = match source.discover().await {
                Ok(modules) => modules,
                Err(e) => {
                    tracing::warn!(
                        source = source.source_type(),
                        error = %e,
                        "Discovery source failed"
                    );
                    continue;
                }
            };

            if !modules.is_empty() {
                tracing::debug!(
                    source = source.source_type(),
                    count = modules.len(),
                    "Discovered modules"
                );
            }

            for module in modules {
                if seen.insert(module.metadata.name.clone()) {
                    all_modules.push(module);
                } else {
                    tracing::debug!(
                        module = %module.metadata.name,
                        source = source.source_type(),
                        "Dropping shadowed module"
                    );
                }
            }
        }

        all_modules
    }
}
