//! Project-local module discovery.
//!
//! Scans `.modrun/modules` in the project root with all results trusted
//! (project-local code is under the operator's own control), and synthesizes
//! one engine-function module when the project carries a `dagger.json`
//! build descriptor.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::user_dir::scan_manifest_dir;
use super::DiscoverySource;
use crate::core::ModulesConfig;
use crate::module::{
    DaggerSpec, Module, ModuleCommand, ModuleMetadata, ModuleResult, ModuleSpec, ModuleType,
};

/// Project-relative directory holding module manifests.
pub const PROJECT_MODULES_DIR: &str = ".modrun/modules";

/// Build descriptor marking the project itself as an engine module.
pub const ENGINE_DESCRIPTOR: &str = "dagger.json";

/// Discovery source for the current project.
pub struct ProjectSource {
    root: PathBuf,
}

impl ProjectSource {
    pub fn new(_config: &ModulesConfig) -> Self {
        Self { root: PathBuf::from(".") }
    }

    /// Scan against an explicit project root. Used by tests.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    fn engine_module(&self) -> Module {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let project_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_lowercase();

        Module {
            api_version: super::builtin::BUILTIN_API_VERSION.to_string(),
            kind: "Module".to_string(),
            metadata: ModuleMetadata {
                name: format!("dagger-{project_name}"),
                version: "1.0.0".to_string(),
                description: format!("Engine functions from {project_name}"),
                author: "project".to_string(),
                tags: vec![],
                labels: std::collections::HashMap::new(),
            },
            spec: ModuleSpec {
                module_type: ModuleType::Dagger,
                docker: None,
                dagger: Some(DaggerSpec { module: ".".to_string(), function: String::new() }),
                commands: vec![ModuleCommand {
                    name: "call".to_string(),
                    description: "Run engine functions from this project".to_string(),
                    usage: None,
                    flags: vec![],
                    examples: vec![],
                }],
                dependencies: vec![],
                permissions: vec![],
            },
            path: root,
            source: "project".to_string(),
            loaded_at: Utc::now(),
            trusted: true,
        }
    }
}

#[async_trait]
impl DiscoverySource for ProjectSource {
    fn source_type(&self) -> &str {
        "project"
    }

    async fn discover(&self) -> ModuleResult<Vec<Module>> {
        let mut modules =
            scan_manifest_dir(&self.root.join(PROJECT_MODULES_DIR), "project", true)?;

        if self.root.join(ENGINE_DESCRIPTOR).exists() {
            modules.push(self.engine_module());
        }

        Ok(modules)
    }
}
