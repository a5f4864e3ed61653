//! Module subsystem: pluggable, self-describing units of functionality.
//!
//! A module declares metadata, commands with typed flags, and exactly one
//! execution backend. Modules are discovered from multiple sources (builtin,
//! user directory, project directory, remote repositories), merged into one
//! deduplicated catalog, and executed through pluggable backends.
//!
//! # Architecture
//!
//! ```text
//! ModuleManager.load
//!   └── DiscoveryManager ── builtin / user / project / remote sources
//!         └── catalog (first-seen-wins, name-keyed)
//! ModuleManager.execute
//!   ├── declared-command check
//!   ├── trust gate (is_executable)
//!   └── ExecutorRegistry ── BridgeExecutor (docker) / DaggerExecutor (dagger)
//! ```
//!
//! Every discovered command is also exposed as a dynamically generated CLI
//! subcommand with typed flags (see [`cli`]).

pub mod cli;
pub mod discovery;
mod error;
pub mod executor;
pub mod manager;
pub mod manifest;
mod types;

pub use discovery::{
    BuiltinSource, DiscoveryManager, DiscoverySource, ProjectSource, RemoteSource, UserDirSource,
};
pub use error::{ModuleError, ModuleResult};
pub use executor::{
    BridgeAdapter, BridgeExecutor, DaggerCli, DaggerExecutor, EngineOutput, ExecutorRegistry,
    FunctionEngine, ModuleExecutor, PrefixAdapter, BRIDGE_PROGRAM_ENV,
};
pub use manager::{is_executable, ModuleManager, ModulePolicy};
pub use types::{
    DaggerSpec, DockerSpec, ExecutionResult, FlagType, FlagValue, Module, ModuleCommand,
    ModuleFlag, ModuleMetadata, ModuleSpec, ModuleType, VolumeMount,
};
