//! # Modrun
//!
//! Pluggable module dispatcher: discover self-describing tool modules from
//! multiple sources and run their commands through pluggable execution
//! backends, with every discovered command exposed as a typed CLI
//! subcommand.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install modrun
//!
//! # List discovered modules
//! modrun list
//!
//! # Run a module command
//! modrun lint ./infra
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::too_many_lines)]

pub mod core;
pub mod module;

pub use core::{Config, ModulesConfig, RemoteRepository};
pub use module::{
    ExecutionResult, FlagType, FlagValue, Module, ModuleError, ModuleManager, ModuleResult,
    ModuleType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "modrun";
