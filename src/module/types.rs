//! Module descriptor types.
//!
//! A module is a self-describing, discoverable unit of functionality: it
//! declares metadata, the commands it exposes, their flags, and exactly one
//! execution backend. Descriptors are parsed from `module.yaml` manifests or
//! synthesized by discovery sources.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution backend a module declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Container-image-backed module.
    Docker,
    /// Engine-function-backed module.
    Dagger,
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Dagger => write!(f, "dagger"),
        }
    }
}

/// A discoverable module descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Schema version tag (free-form, kept for forward compatibility).
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// Fixed literal `Module`.
    pub kind: String,
    /// Module identification.
    pub metadata: ModuleMetadata,
    /// Behavior and backend integration.
    pub spec: ModuleSpec,

    // Runtime fields, attached after load. Not part of the manifest.
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(skip)]
    pub source: String,
    #[serde(skip, default = "Utc::now")]
    pub loaded_at: DateTime<Utc>,
    #[serde(skip)]
    pub trusted: bool,
}

/// Module identification metadata. `name` is the catalog's primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

/// Module behavior: backend type, backend config, and declared commands.
///
/// Exactly one of `docker`/`dagger` must be populated, matching `module_type`.
/// Enforced by [`validate`](crate::module::manifest::validate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dagger: Option<DaggerSpec>,
    #[serde(default)]
    pub commands: Vec<ModuleCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

/// Container-image backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSpec {
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, rename = "workingDir", skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMount>,
}

/// Engine-function backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaggerSpec {
    /// Module reference passed to the engine (path or address).
    pub module: String,
    /// Function to invoke. Empty means the command name is used.
    #[serde(default)]
    pub function: String,
}

/// A volume mount for container-backed modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMount {
    pub source: String,
    pub target: String,
    /// bind, volume, or tmpfs.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mount_type: Option<String>,
}

/// A CLI command declared by a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<ModuleFlag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Supported flag types. Closed set: a manifest declaring anything else
/// fails at parse time, never at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "[]string")]
    StringList,
}

/// A command-line flag declared by a module command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleFlag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    /// Only meaningful for string and int flags.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Optional allowed-value set (string flags).
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

/// A typed flag value, decoded from the CLI frontend or a manifest default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    String(String),
    StringList(Vec<String>),
}

impl FlagValue {
    /// The flag type this value belongs to.
    pub fn flag_type(&self) -> FlagType {
        match self {
            Self::String(_) => FlagType::String,
            Self::Bool(_) => FlagType::Bool,
            Self::Int(_) => FlagType::Int,
            Self::StringList(_) => FlagType::StringList,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::StringList(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// Result of one module command execution. Created fresh per call and
/// returned synchronously; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ExecutionResult {
    /// Check if the execution succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl Module {
    /// Whether the module declares a command with the given name.
    pub fn has_command(&self, name: &str) -> bool {
        self.spec.commands.iter().any(|c| c.name == name)
    }

    /// Look up a declared command by name.
    pub fn command(&self, name: &str) -> Option<&ModuleCommand> {
        self.spec.commands.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_display() {
        assert_eq!(ModuleType::Docker.to_string(), "docker");
        assert_eq!(ModuleType::Dagger.to_string(), "dagger");
    }

    #[test]
    fn test_flag_value_types() {
        assert_eq!(FlagValue::String("x".into()).flag_type(), FlagType::String);
        assert_eq!(FlagValue::Bool(true).flag_type(), FlagType::Bool);
        assert_eq!(FlagValue::Int(3).flag_type(), FlagType::Int);
        assert_eq!(FlagValue::StringList(vec![]).flag_type(), FlagType::StringList);
    }

    #[test]
    fn test_flag_value_yaml_untagged() {
        let v: FlagValue = serde_yaml::from_str("true").unwrap();
        assert_eq!(v, FlagValue::Bool(true));
        let v: FlagValue = serde_yaml::from_str("42").unwrap();
        assert_eq!(v, FlagValue::Int(42));
        let v: FlagValue = serde_yaml::from_str("aws").unwrap();
        assert_eq!(v, FlagValue::String("aws".into()));
        let v: FlagValue = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(v, FlagValue::StringList(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_has_command() {
        let module = Module {
            api_version: "modrun.dev/v1".into(),
            kind: "Module".into(),
            metadata: ModuleMetadata {
                name: "demo".into(),
                version: "1.0.0".into(),
                description: String::new(),
                author: String::new(),
                tags: vec![],
                labels: HashMap::new(),
            },
            spec: ModuleSpec {
                module_type: ModuleType::Docker,
                docker: None,
                dagger: None,
                commands: vec![ModuleCommand {
                    name: "lint".into(),
                    description: String::new(),
                    usage: None,
                    flags: vec![],
                    examples: vec![],
                }],
                dependencies: vec![],
                permissions: vec![],
            },
            path: PathBuf::new(),
            source: "builtin".into(),
            loaded_at: Utc::now(),
            trusted: true,
        };

        assert!(module.has_command("lint"));
        assert!(!module.has_command("fmt"));
        assert!(module.command("lint").is_some());
    }
}
