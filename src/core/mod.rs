//! Core types and functionality for modrun.
//!
//! Holds the configuration model shared by the CLI and the module
//! subsystem.

mod config;

pub use config::{Config, GeneralConfig, ModulesConfig, RemoteRepository};
