//! Module executors and capability-based dispatch.
//!
//! An executor runs one backend type's modules and returns a normalized
//! [`ExecutionResult`]. The [`ExecutorRegistry`] maps a module's declared
//! backend type to the executor capable of running it and performs the
//! capability check before dispatch.

mod bridge;
mod engine;

pub use bridge::{BridgeAdapter, BridgeExecutor, PrefixAdapter, BRIDGE_PROGRAM_ENV};
pub use engine::{DaggerCli, DaggerExecutor, EngineOutput, FunctionEngine};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ExecutionResult, FlagValue, Module, ModuleError, ModuleResult, ModuleType};

/// Trait for module execution backends.
///
/// `can_execute` is checked by the registry before `execute` is called; an
/// executor handed a module it cannot run is a contract violation, not a
/// runtime condition to recover from.
#[async_trait]
pub trait ModuleExecutor: Send + Sync {
    /// Whether this executor can run the given module.
    fn can_execute(&self, module: &Module) -> bool;

    /// Run one module command.
    async fn execute(
        &self,
        module: &Module,
        command: &str,
        args: &[String],
        flags: &HashMap<String, FlagValue>,
    ) -> ModuleResult<ExecutionResult>;
}

/// Maps backend types to executors.
pub struct ExecutorRegistry {
    executors: HashMap<ModuleType, Arc<dyn ModuleExecutor>>,
}

impl ExecutorRegistry {
    /// Create a registry with the built-in executor pair.
    pub fn new() -> Self {
        let mut registry = Self { executors: HashMap::new() };
        registry.register(ModuleType::Docker, Arc::new(BridgeExecutor::new()));
        registry.register(ModuleType::Dagger, Arc::new(DaggerExecutor::new(Arc::new(DaggerCli::new()))));
        registry
    }

    /// Create an empty registry. Callers register their own executors.
    pub fn empty() -> Self {
        Self { executors: HashMap::new() }
    }

    /// Register an executor for a backend type, replacing any previous one.
    /// Additional backend types are additive; no dispatch code changes.
    pub fn register(&mut self, module_type: ModuleType, executor: Arc<dyn ModuleExecutor>) {
        self.executors.insert(module_type, executor);
    }

    /// Dispatch a module command to the executor for its backend type.
    pub async fn execute(
        &self,
        module: &Module,
        command: &str,
        args: &[String],
        flags: &HashMap<String, FlagValue>,
    ) -> ModuleResult<ExecutionResult> {
        let executor = self
            .executors
            .get(&module.spec.module_type)
            .ok_or(ModuleError::UnsupportedBackend(module.spec.module_type))?;

        if !executor.can_execute(module) {
            return Err(ModuleError::CapabilityMismatch {
                module: module.metadata.name.clone(),
                backend: module.spec.module_type,
            });
        }

        executor.execute(module, command, args, flags).await
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
