//! Engine-function executor for dagger-backed modules.
//!
//! The container-execution engine is an external collaborator consumed
//! through the narrow [`FunctionEngine`] contract: invoke a function of a
//! module reference with arguments, get back stdout, stderr, and an exit
//! code. The default engine shells out to the `dagger` binary.
//!
//! A nonzero engine exit becomes a normal [`ExecutionResult`] carrying the
//! engine's exit code and stderr; it is never reported as optimistic
//! success.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::ModuleExecutor;
use crate::module::{ExecutionResult, FlagValue, Module, ModuleError, ModuleResult, ModuleType};

/// Output of one engine function invocation.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Narrow interface to the external function-execution engine.
#[async_trait]
pub trait FunctionEngine: Send + Sync {
    /// Invoke `function` of the module at `module_ref` with `args`.
    async fn call(
        &self,
        module_ref: &str,
        function: &str,
        args: &[String],
    ) -> ModuleResult<EngineOutput>;
}

/// Default engine: shells out to the `dagger` CLI.
pub struct DaggerCli {
    binary: String,
}

impl DaggerCli {
    pub fn new() -> Self {
        Self { binary: "dagger".to_string() }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for DaggerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionEngine for DaggerCli {
    async fn call(
        &self,
        module_ref: &str,
        function: &str,
        args: &[String],
    ) -> ModuleResult<EngineOutput> {
        let output = tokio::process::Command::new(&self.binary)
            .arg("call")
            .arg("-m")
            .arg(module_ref)
            .arg(function)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ModuleError::execution(format!("failed to invoke engine: {e}")))?;

        Ok(EngineOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(1),
        })
    }
}

/// Executor for engine-function-backed modules.
pub struct DaggerExecutor {
    engine: Arc<dyn FunctionEngine>,
}

impl DaggerExecutor {
    pub fn new(engine: Arc<dyn FunctionEngine>) -> Self {
        Self { engine }
    }

    /// Flags rendered as `--name value` argument pairs, sorted for
    /// determinism.
    fn flag_args(flags: &HashMap<String, FlagValue>) -> Vec<String> {
        let mut names: Vec<_> = flags.keys().collect();
        names.sort();
        let mut argv = Vec::with_capacity(names.len() * 2);
        for name in names {
            argv.push(format!("--{name}"));
            argv.push(flags[name].to_string());
        }
        argv
    }
}

#[async_trait]
impl ModuleExecutor for DaggerExecutor {
    fn can_execute(&self, module: &Module) -> bool {
        module.spec.module_type == ModuleType::Dagger && module.spec.dagger.is_some()
    }

    async fn execute(
        &self,
        module: &Module,
        command: &str,
        args: &[String],
        flags: &HashMap<String, FlagValue>,
    ) -> ModuleResult<ExecutionResult> {
        // can_execute guarantees the dagger config is present.
        let spec = module.spec.dagger.as_ref().ok_or_else(|| {
            ModuleError::execution(format!(
                "module '{}' has no dagger config",
                module.metadata.name
            ))
        })?;

        // The declared function wins; an empty declaration means the
        // command name is the function name.
        let function = if spec.function.is_empty() { command } else { spec.function.as_str() };

        let mut engine_args = args.to_vec();
        engine_args.extend(Self::flag_args(flags));

        tracing::debug!(
            module = %module.metadata.name,
            reference = %spec.module,
            function,
            "Calling engine function"
        );

        let start = Instant::now();
        let output = self.engine.call(&spec.module, function, &engine_args).await?;

        let mut metadata = HashMap::new();
        metadata.insert("module".to_string(), spec.module.clone());
        metadata.insert("function".to_string(), function.to_string());

        Ok(ExecutionResult {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            duration: start.elapsed(),
            metadata,
        })
    }
}
