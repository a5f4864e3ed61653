//! Process-bridge executor for container-image-backed modules.
//!
//! The bridge does not launch containers itself. It maps a module's
//! well-known name to a wrapper invocation of the modrun binary and relays
//! the subprocess exit code, stdout, and stderr. This lets legacy hardcoded
//! tool invocations participate in the generic executor contract while a
//! full native container backend is pending.
//!
//! Bridges are an adapter registry keyed by module name, so new legacy
//! bridges are additive registrations rather than edits to a dispatch
//! switch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;

use super::ModuleExecutor;
use crate::module::{ExecutionResult, FlagValue, Module, ModuleError, ModuleResult, ModuleType};

/// Maps a module command to wrapper argv for the modrun binary.
pub trait BridgeAdapter: Send + Sync {
    fn wrapper_args(&self, command: &str, args: &[String]) -> Vec<String>;
}

/// Adapter that prefixes the command with a fixed argv fragment, e.g.
/// `["tf"]` turns `lint ./infra` into `tf lint ./infra`.
pub struct PrefixAdapter {
    prefix: Vec<String>,
}

impl PrefixAdapter {
    pub fn new(prefix: &[&str]) -> Self {
        Self { prefix: prefix.iter().map(|s| (*s).to_string()).collect() }
    }
}

impl BridgeAdapter for PrefixAdapter {
    fn wrapper_args(&self, command: &str, args: &[String]) -> Vec<String> {
        let mut argv = self.prefix.clone();
        argv.push(command.to_string());
        argv.extend(args.iter().cloned());
        argv
    }
}

/// Executor bridging docker-backed modules onto wrapper subcommands.
pub struct BridgeExecutor {
    adapters: HashMap<String, Box<dyn BridgeAdapter>>,
    program: PathBuf,
}

/// Overrides the program the bridge spawns instead of the current binary.
pub const BRIDGE_PROGRAM_ENV: &str = "MODRUN_BRIDGE";

impl BridgeExecutor {
    /// Create a bridge with the built-in adapter set. Targets the current
    /// binary unless [`BRIDGE_PROGRAM_ENV`] points elsewhere. Each adapter
    /// maps onto a hidden wrapper subcommand the binary actually serves.
    pub fn new() -> Self {
        let program = std::env::var_os(BRIDGE_PROGRAM_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::current_exe().unwrap_or_else(|_| PathBuf::from("modrun"))
            });
        let mut executor = Self { adapters: HashMap::new(), program };
        executor.register("terraform-tools", Box::new(PrefixAdapter::new(&["tf"])));
        executor.register("ai-investigate", Box::new(PrefixAdapter::new(&["ai"])));
        executor
    }

    /// Create a bridge with no adapters, targeting an explicit program.
    pub fn with_program(program: PathBuf) -> Self {
        Self { adapters: HashMap::new(), program }
    }

    /// Register an adapter for a module name.
    pub fn register(&mut self, module_name: &str, adapter: Box<dyn BridgeAdapter>) {
        self.adapters.insert(module_name.to_string(), adapter);
    }

    /// Flags rendered as `--name=value` arguments, sorted for determinism.
    fn flag_args(flags: &HashMap<String, FlagValue>) -> Vec<String> {
        let mut names: Vec<_> = flags.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let value = &flags[name];
                format!("--{name}={value}")
            })
            .collect()
    }
}

impl Default for BridgeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleExecutor for BridgeExecutor {
    fn can_execute(&self, module: &Module) -> bool {
        module.spec.module_type == ModuleType::Docker && module.spec.docker.is_some()
    }

    async fn execute(
        &self,
        module: &Module,
        command: &str,
        args: &[String],
        flags: &HashMap<String, FlagValue>,
    ) -> ModuleResult<ExecutionResult> {
        let adapter = self.adapters.get(&module.metadata.name).ok_or_else(|| {
            ModuleError::execution(format!("unknown built-in module: {}", module.metadata.name))
        })?;

        let mut argv = adapter.wrapper_args(command, args);
        argv.extend(Self::flag_args(flags));

        tracing::debug!(
            program = %self.program.display(),
            args = ?argv,
            "Bridging module command"
        );

        let start = Instant::now();
        let output = tokio::process::Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ExecutionResult {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
            metadata: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DockerSpec, ModuleMetadata, ModuleSpec};

    fn docker_module(name: &str) -> Module {
        Module {
            api_version: "modrun.dev/v1".into(),
            kind: "Module".into(),
            metadata: ModuleMetadata {
                name: name.into(),
                version: "1.0.0".into(),
                description: String::new(),
                author: String::new(),
                tags: vec![],
                labels: HashMap::new(),
            },
            spec: ModuleSpec {
                module_type: ModuleType::Docker,
                docker: Some(DockerSpec {
                    image: "example:latest".into(),
                    entrypoint: vec![],
                    env: HashMap::new(),
                    working_dir: None,
                    volumes: vec![],
                }),
                dagger: None,
                commands: vec![],
                dependencies: vec![],
                permissions: vec![],
            },
            path: PathBuf::new(),
            source: "builtin".into(),
            loaded_at: chrono::Utc::now(),
            trusted: true,
        }
    }

    #[test]
    fn test_builtin_adapters_cover_shipped_modules() {
        let executor = BridgeExecutor::new();
        assert!(executor.adapters.contains_key("terraform-tools"));
        assert!(executor.adapters.contains_key("ai-investigate"));
    }

    #[test]
    fn test_prefix_adapter() {
        let adapter = PrefixAdapter::new(&["tf"]);
        let argv = adapter.wrapper_args("lint", &["./infra".to_string()]);
        assert_eq!(argv, vec!["tf", "lint", "./infra"]);
    }

    #[test]
    fn test_can_execute_requires_docker_config() {
        let executor = BridgeExecutor::new();
        let mut module = docker_module("terraform-tools");
        assert!(executor.can_execute(&module));

        module.spec.docker = None;
        assert!(!executor.can_execute(&module));
    }

    #[test]
    fn test_flag_args_sorted() {
        let mut flags = HashMap::new();
        flags.insert("zeta".to_string(), FlagValue::Int(3));
        flags.insert("alpha".to_string(), FlagValue::Bool(true));
        assert_eq!(BridgeExecutor::flag_args(&flags), vec!["--alpha=true", "--zeta=3"]);
    }

    #[tokio::test]
    async fn test_unknown_module_fails() {
        let executor = BridgeExecutor::with_program(PathBuf::from("true"));
        let module = docker_module("mystery");

        let err = executor.execute(&module, "run", &[], &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, ModuleError::Execution { .. }));
        assert!(err.to_string().contains("unknown built-in module"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relays_exit_code_and_output() {
        // /bin/sh -c 'echo out; echo err >&2; exit 2' -- wrapper args are
        // appended after -c's script so they are harmless here.
        let mut executor = BridgeExecutor::with_program(PathBuf::from("/bin/sh"));
        executor.register(
            "shim",
            Box::new(PrefixAdapter::new(&["-c", "echo out; echo err >&2; exit 2"])),
        );

        let module = docker_module("shim");
        let result = executor.execute(&module, "run", &[], &HashMap::new()).await.unwrap();

        assert_eq!(result.exit_code, 2);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert!(!result.success());
    }
}
