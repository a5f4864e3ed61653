//! Configuration management for modrun.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Module discovery and execution settings
    pub modules: ModulesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging by default
    pub verbose: bool,
}

/// Module subsystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Allow execution of untrusted modules
    pub allow_untrusted: bool,

    /// Extra module directories to scan (support `~` expansion)
    pub directories: Vec<String>,

    /// Remote module repositories
    pub repositories: Vec<RemoteRepository>,

    /// Cache directory for remote manifests (defaults to ~/.modrun/cache)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Per-execution deadline in seconds
    pub execution_timeout_secs: u64,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            allow_untrusted: false,
            directories: Vec::new(),
            repositories: Vec::new(),
            cache_dir: None,
            execution_timeout_secs: 600,
        }
    }
}

/// A remote module repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub url: String,

    /// Branch, tag, or release ref within the repository
    #[serde(default, rename = "ref")]
    pub reference: String,

    /// Whether modules from this repository are trusted
    #[serde(default)]
    pub trusted: bool,
}

impl ModulesConfig {
    /// Resolve the remote-manifest cache directory.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return PathBuf::from(shellexpand::tilde(dir).into_owned());
        }
        dirs::home_dir()
            .map(|home| home.join(".modrun").join("cache"))
            .unwrap_or_else(|| PathBuf::from(".modrun-cache"))
    }

    /// Per-execution deadline.
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.modrun.toml` in current directory
    /// 2. `~/.config/modrun/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".modrun.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("modrun").join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let modrun_dir = config_dir.join("modrun");
        std::fs::create_dir_all(&modrun_dir)?;

        let config_path = modrun_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("modrun"))
    }
}
