//! Module subsystem error types.

use thiserror::Error;

use super::ModuleType;

/// Result type for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Errors that can occur during module discovery and execution.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A discovery source failed. Degraded to a warning by the discovery
    /// manager; never fatal to a load.
    #[error("Discovery failed for source '{source_type}': {message}")]
    Discovery { source_type: String, message: String },

    /// A module manifest could not be parsed or failed validation. Skips
    /// one manifest, siblings still load.
    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    /// No module with the given name exists in the catalog.
    #[error("Module not found: {0}")]
    NotFound(String),

    /// The module exists but does not declare the requested command.
    #[error("Command '{command}' not found in module '{module}'")]
    CommandNotFound { module: String, command: String },

    /// The module is untrusted and untrusted execution is disabled.
    #[error("Module '{0}' is not trusted and untrusted modules are disabled")]
    TrustDenied(String),

    /// No executor is registered for the module's backend type.
    #[error("No executor registered for module type: {0}")]
    UnsupportedBackend(ModuleType),

    /// The registered executor refused the module. Configuration error,
    /// not retried.
    #[error("Executor for '{backend}' cannot execute module '{module}'")]
    CapabilityMismatch { module: String, backend: ModuleType },

    /// Backend execution failed. Carries captured output for diagnostics.
    #[error("Execution failed: {message}")]
    Execution { message: String, stdout: String, stderr: String },

    /// Execution exceeded the configured deadline.
    #[error(
        "Module '{module}' timed out after {seconds}s (long-running server \
         processes are not supported through module commands)"
    )]
    Timeout { module: String, seconds: u64 },

    /// Network error while fetching remote manifests.
    #[error("Network error: {0}")]
    Network(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModuleError {
    /// Build an execution error without captured output.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution { message: message.into(), stdout: String::new(), stderr: String::new() }
    }
}
