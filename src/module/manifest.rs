//! Module manifest parsing and validation.
//!
//! A module manifest is a `module.yaml` file describing a module's metadata,
//! backend configuration, and declared commands. Parsing one bad manifest
//! never aborts discovery of its siblings; the caller records a warning and
//! moves on.

use std::path::Path;

use super::{FlagType, Module, ModuleError, ModuleResult, ModuleType};

/// Name of the manifest file inside each module directory.
pub const MANIFEST_FILE: &str = "module.yaml";

/// Parse a manifest from a YAML string and validate it.
pub fn from_yaml(content: &str) -> ModuleResult<Module> {
    let module: Module = serde_yaml::from_str(content)
        .map_err(|e| ModuleError::InvalidManifest(e.to_string()))?;
    validate(&module)?;
    Ok(module)
}

/// Parse a manifest from a file and validate it.
pub fn from_file(path: &Path) -> ModuleResult<Module> {
    let content = std::fs::read_to_string(path)?;
    from_yaml(&content)
}

/// Validate a module descriptor.
///
/// Enforces the backend invariant: exactly one backend config is populated
/// and it matches the declared type.
pub fn validate(module: &Module) -> ModuleResult<()> {
    let name = &module.metadata.name;

    if name.is_empty() {
        return Err(ModuleError::InvalidManifest("module name is required".to_string()));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(ModuleError::InvalidManifest(format!(
            "module name '{name}' must contain only alphanumeric characters, hyphens, and underscores"
        )));
    }

    if module.metadata.version.is_empty() {
        return Err(ModuleError::InvalidManifest(format!(
            "module '{name}' is missing a version"
        )));
    }

    match module.spec.module_type {
        ModuleType::Docker => {
            if module.spec.docker.is_none() {
                return Err(ModuleError::InvalidManifest(format!(
                    "module '{name}' declares type 'docker' but has no docker config"
                )));
            }
            if module.spec.dagger.is_some() {
                return Err(ModuleError::InvalidManifest(format!(
                    "module '{name}' declares type 'docker' but also has a dagger config"
                )));
            }
        }
        ModuleType::Dagger => {
            if module.spec.dagger.is_none() {
                return Err(ModuleError::InvalidManifest(format!(
                    "module '{name}' declares type 'dagger' but has no dagger config"
                )));
            }
            if module.spec.docker.is_some() {
                return Err(ModuleError::InvalidManifest(format!(
                    "module '{name}' declares type 'dagger' but also has a docker config"
                )));
            }
        }
    }

    for command in &module.spec.commands {
        if command.name.is_empty() {
            return Err(ModuleError::InvalidManifest(format!(
                "module '{name}' declares a command without a name"
            )));
        }
        for flag in &command.flags {
            if let Some(default) = &flag.default {
                if default.flag_type() != flag.flag_type {
                    return Err(ModuleError::InvalidManifest(format!(
                        "flag '--{}' of command '{}' has a default that does not match its declared type",
                        flag.name, command.name
                    )));
                }
            }
            if flag.required && !matches!(flag.flag_type, FlagType::String | FlagType::Int) {
                return Err(ModuleError::InvalidManifest(format!(
                    "flag '--{}' of command '{}' is marked required but only string and int flags may be required",
                    flag.name, command.name
                )));
            }
        }
    }

    Ok(())
}
