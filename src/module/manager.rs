//! Module manager: discovery orchestration, trust policy, execution.
//!
//! The manager owns the in-memory catalog produced by one `load` pass.
//! Catalog entries are immutable after load; `load` swaps a fresh snapshot
//! under a lock, so concurrent readers keep their previous snapshot and
//! never observe a half-built catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::discovery::DiscoveryManager;
use super::executor::ExecutorRegistry;
use super::{ExecutionResult, FlagValue, Module, ModuleError, ModuleResult};
use crate::core::ModulesConfig;

/// Trust and execution policy derived from configuration.
#[derive(Debug, Clone)]
pub struct ModulePolicy {
    pub allow_untrusted: bool,
    pub execution_timeout: Duration,
}

impl From<&ModulesConfig> for ModulePolicy {
    fn from(config: &ModulesConfig) -> Self {
        Self {
            allow_untrusted: config.allow_untrusted,
            execution_timeout: config.execution_timeout(),
        }
    }
}

/// The single trust decision point. Called exactly once per execution,
/// before any executor is reached.
pub fn is_executable(module: &Module, policy: &ModulePolicy) -> bool {
    module.trusted || policy.allow_untrusted
}

/// Composes discovery and execution behind the trust gate.
pub struct ModuleManager {
    discovery: DiscoveryManager,
    executors: ExecutorRegistry,
    catalog: RwLock<Arc<Vec<Module>>>,
    policy: ModulePolicy,
}

impl ModuleManager {
    /// Create a manager with the standard discovery sources and executors.
    pub fn new(config: &ModulesConfig) -> Self {
        Self {
            discovery: DiscoveryManager::new(config),
            executors: ExecutorRegistry::new(),
            catalog: RwLock::new(Arc::new(Vec::new())),
            policy: ModulePolicy::from(config),
        }
    }

    /// Create a manager from explicit collaborators. Used by tests.
    pub fn with_parts(
        discovery: DiscoveryManager,
        executors: ExecutorRegistry,
        policy: ModulePolicy,
    ) -> Self {
        Self { discovery, executors, catalog: RwLock::new(Arc::new(Vec::new())), policy }
    }

    /// Discover modules from all sources and replace the catalog.
    pub async fn load(&self) {
        let modules = self.discovery.discover_all().await;
        tracing::debug!(count = modules.len(), "Loaded module catalog");
        *self.catalog.write() = Arc::new(modules);
    }

    /// Snapshot of the current catalog.
    pub fn modules(&self) -> Arc<Vec<Module>> {
        Arc::clone(&self.catalog.read())
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> ModuleResult<Module> {
        // Catalogs are tens to low hundreds of entries; a linear scan is
        // fine and keeps the catalog a plain snapshot.
        self.modules()
            .iter()
            .find(|m| m.metadata.name == name)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    /// Execute a module command.
    ///
    /// Validates existence and the declared command set, then applies the
    /// trust gate before the executor registry is consulted. An untrusted
    /// module can never reach an executor regardless of backend type.
    pub async fn execute(
        &self,
        module_name: &str,
        command: &str,
        args: &[String],
        flags: &HashMap<String, FlagValue>,
    ) -> ModuleResult<ExecutionResult> {
        let module = self.get(module_name)?;

        if !module.has_command(command) {
            return Err(ModuleError::CommandNotFound {
                module: module_name.to_string(),
                command: command.to_string(),
            });
        }

        if !is_executable(&module, &self.policy) {
            return Err(ModuleError::TrustDenied(module_name.to_string()));
        }

        let deadline = self.policy.execution_timeout;
        match tokio::time::timeout(
            deadline,
            self.executors.execute(&module, command, args, flags),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ModuleError::Timeout {
                module: module_name.to_string(),
                seconds: deadline.as_secs(),
            }),
        }
    }
}
