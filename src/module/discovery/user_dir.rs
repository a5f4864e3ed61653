//! User-directory module discovery.
//!
//! Scans `~/.modrun/modules/*/module.yaml` plus any extra directories
//! configured under `modules.directories`. User modules are untrusted
//! unless the configuration explicitly allows untrusted modules.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;

use super::DiscoverySource;
use crate::core::ModulesConfig;
use crate::module::{manifest, Module, ModuleError, ModuleResult};

/// Discovery source for the per-user modules directory.
pub struct UserDirSource {
    dir: Option<PathBuf>,
    extra_dirs: Vec<PathBuf>,
    allow_untrusted: bool,
}

impl UserDirSource {
    pub fn new(config: &ModulesConfig) -> Self {
        let dir = dirs::home_dir().map(|home| home.join(".modrun").join("modules"));
        let extra_dirs = config
            .directories
            .iter()
            .map(|d| PathBuf::from(shellexpand::tilde(d).into_owned()))
            .collect();
        Self { dir, extra_dirs, allow_untrusted: config.allow_untrusted }
    }

    /// Scan against an explicit directory. Used by tests.
    pub fn with_dir(dir: PathBuf, allow_untrusted: bool) -> Self {
        Self { dir: Some(dir), extra_dirs: Vec::new(), allow_untrusted }
    }
}

#[async_trait]
impl DiscoverySource for UserDirSource {
    fn source_type(&self) -> &str {
        "user"
    }

    async fn discover(&self) -> ModuleResult<Vec<Module>> {
        let Some(dir) = &self.dir else {
            return Err(ModuleError::Discovery {
                source_type: "user".to_string(),
                message: "could not determine home directory".to_string(),
            });
        };

        // Untrusted by default: only the explicit opt-in marks user modules
        // executable without the trust gate rejecting them.
        let mut modules = scan_manifest_dir(dir, "user", self.allow_untrusted)?;
        for extra in &self.extra_dirs {
            modules.extend(scan_manifest_dir(extra, "user", self.allow_untrusted)?);
        }
        Ok(modules)
    }
}

/// Scan a directory of module subdirectories for `module.yaml` manifests.
///
/// A missing root directory yields zero modules. One malformed manifest is
/// recorded as a warning and skipped; siblings still load.
pub(crate) fn scan_manifest_dir(
    dir: &Path,
    source: &str,
    trusted: bool,
) -> ModuleResult<Vec<Module>> {
    let mut modules = Vec::new();

    if !dir.exists() {
        return Ok(modules);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ModuleError::Discovery {
        source_type: source.to_string(),
        message: format!("failed to read {}: {e}", dir.display()),
    })?;

    for entry in entries.filter_map(Result::ok) {
        let module_path = entry.path();
        if !module_path.is_dir() {
            continue;
        }

        let manifest_path = module_path.join(manifest::MANIFEST_FILE);
        if !manifest_path.exists() {
            continue;
        }

        match manifest::from_file(&manifest_path) {
            Ok(mut module) => {
                module.path = module_path;
                module.source = source.to_string();
                module.loaded_at = Utc::now();
                module.trusted = trusted;
                modules.push(module);
            }
            Err(e) => {
                tracing::warn!(
                    manifest = %manifest_path.display(),
                    error = %e,
                    "Skipping malformed module manifest"
                );
            }
        }
    }

    Ok(modules)
}
