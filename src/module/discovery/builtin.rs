//! Built-in module discovery.
//!
//! Describes the tools shipped with modrun itself. Built-in modules are
//! always trusted and are registered first, so no other source can shadow
//! their names.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::DiscoverySource;
use crate::module::{
    DockerSpec, FlagType, FlagValue, Module, ModuleCommand, ModuleFlag, ModuleMetadata,
    ModuleResult, ModuleSpec, ModuleType,
};

/// API version stamped on built-in descriptors.
pub const BUILTIN_API_VERSION: &str = "modrun.dev/v1";

/// Discovery source for modules shipped with modrun.
pub struct BuiltinSource;

impl BuiltinSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuiltinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoverySource for BuiltinSource {
    fn source_type(&self) -> &str {
        "builtin"
    }

    async fn discover(&self) -> ModuleResult<Vec<Module>> {
        Ok(vec![terraform_tools(), ai_investigate()])
    }
}

fn builtin(metadata: ModuleMetadata, spec: ModuleSpec) -> Module {
    Module {
        api_version: BUILTIN_API_VERSION.to_string(),
        kind: "Module".to_string(),
        metadata,
        spec,
        path: PathBuf::new(),
        source: "builtin".to_string(),
        loaded_at: Utc::now(),
        trusted: true,
    }
}

fn terraform_tools() -> Module {
    builtin(
        ModuleMetadata {
            name: "terraform-tools".to_string(),
            version: "1.0.0".to_string(),
            description: "Terraform analysis and documentation tools".to_string(),
            author: "modrun".to_string(),
            tags: vec!["terraform".to_string(), "iac".to_string()],
            labels: HashMap::new(),
        },
        ModuleSpec {
            module_type: ModuleType::Docker,
            docker: Some(DockerSpec {
                image: "ghcr.io/modrun/terraform-tools:1.0.0".to_string(),
                entrypoint: vec![],
                env: HashMap::new(),
                working_dir: None,
                volumes: vec![],
            }),
            dagger: None,
            commands: vec![
                ModuleCommand {
                    name: "lint".to_string(),
                    description: "Run TFLint on Terraform code".to_string(),
                    usage: None,
                    flags: vec![],
                    examples: vec!["modrun lint ./infra".to_string()],
                },
                ModuleCommand {
                    name: "checkov-scan".to_string(),
                    description: "Run Checkov security scan".to_string(),
                    usage: None,
                    flags: vec![],
                    examples: vec![],
                },
                ModuleCommand {
                    name: "cost-estimate".to_string(),
                    description: "Estimate infrastructure costs".to_string(),
                    usage: None,
                    flags: vec![],
                    examples: vec![],
                },
            ],
            dependencies: vec![],
            permissions: vec![],
        },
    )
}

fn ai_investigate() -> Module {
    builtin(
        ModuleMetadata {
            name: "ai-investigate".to_string(),
            version: "1.0.0".to_string(),
            description: "AI-powered infrastructure investigation".to_string(),
            author: "modrun".to_string(),
            tags: vec!["ai".to_string()],
            labels: HashMap::new(),
        },
        ModuleSpec {
            module_type: ModuleType::Docker,
            docker: Some(DockerSpec {
                image: "ghcr.io/modrun/ai-investigate:1.0.0".to_string(),
                entrypoint: vec![],
                env: HashMap::new(),
                working_dir: None,
                volumes: vec![],
            }),
            dagger: None,
            commands: vec![ModuleCommand {
                name: "investigate".to_string(),
                description: "Investigate infrastructure using natural language".to_string(),
                usage: None,
                flags: vec![
                    ModuleFlag {
                        name: "prompt".to_string(),
                        short: None,
                        flag_type: FlagType::String,
                        default: None,
                        required: true,
                        description: "Natural language investigation prompt".to_string(),
                        enum_values: vec![],
                    },
                    ModuleFlag {
                        name: "provider".to_string(),
                        short: Some('p'),
                        flag_type: FlagType::String,
                        default: Some(FlagValue::String("aws".to_string())),
                        required: false,
                        description: "Cloud provider".to_string(),
                        enum_values: vec![
                            "aws".to_string(),
                            "azure".to_string(),
                            "gcp".to_string(),
                        ],
                    },
                ],
                examples: vec![],
            }],
            dependencies: vec![],
            permissions: vec![],
        },
    )
}
