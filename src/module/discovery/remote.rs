//! Remote-repository module discovery.
//!
//! A repository is a base URL serving an `index.yaml` that lists relative
//! paths of module manifests. Manifests are the same `module.yaml` documents
//! local sources use, so the discovery manager's merge logic needs no
//! special case for remote modules.
//!
//! Fetches are cache-aside read-through: fetched manifests are written to a
//! per-repository cache directory keyed by `sha256(url + ref)`, and the cache
//! is used when the repository is unreachable. A repository with neither a
//! reachable index nor a cache contributes zero modules with a warning.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::DiscoverySource;
use crate::core::{ModulesConfig, RemoteRepository};
use crate::module::{manifest, Module, ModuleError, ModuleResult};

/// Request timeout for index and manifest fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Repository index document (`index.yaml`).
#[derive(Debug, Deserialize)]
struct RepoIndex {
    /// Relative paths of module manifests within the repository.
    modules: Vec<String>,
}

/// Discovery source for configured remote repositories.
pub struct RemoteSource {
    repositories: Vec<RemoteRepository>,
    cache_dir: PathBuf,
    allow_untrusted: bool,
    client: reqwest::Client,
}

impl RemoteSource {
    pub fn new(config: &ModulesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("modrun/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            repositories: config.repositories.clone(),
            cache_dir: config.resolved_cache_dir(),
            allow_untrusted: config.allow_untrusted,
            client,
        }
    }

    /// Cache directory for one repository, keyed by url + ref.
    fn repo_cache_dir(&self, repo: &RemoteRepository) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(repo.url.as_bytes());
        hasher.update(repo.reference.as_bytes());
        let digest = hasher.finalize();
        let key: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        self.cache_dir.join(key)
    }

    /// Base URL with the ref appended as a path segment when set.
    fn repo_base(repo: &RemoteRepository) -> String {
        let base = repo.url.trim_end_matches('/');
        if repo.reference.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{}", repo.reference)
        }
    }

    async fn fetch_text(&self, url: &str) -> ModuleResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ModuleError::Network(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ModuleError::Network(format!("GET {url}: HTTP {}", response.status())));
        }

        response.text().await.map_err(|e| ModuleError::Network(format!("GET {url}: {e}")))
    }

    /// Fetch a repository's manifests and refresh its cache.
    async fn fetch_repo(&self, repo: &RemoteRepository) -> ModuleResult<Vec<Module>> {
        let base = Self::repo_base(repo);
        let index_text = self.fetch_text(&format!("{base}/index.yaml")).await?;
        let index: RepoIndex = serde_yaml::from_str(&index_text)
            .map_err(|e| ModuleError::InvalidManifest(format!("repository index: {e}")))?;

        let cache = self.repo_cache_dir(repo);
        std::fs::create_dir_all(&cache)?;

        let mut modules = Vec::new();
        for path in &index.modules {
            let url = format!("{base}/{}", path.trim_start_matches('/'));
            let text = match self.fetch_text(&url).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping unreachable remote manifest");
                    continue;
                }
            };

            match manifest::from_yaml(&text) {
                Ok(module) => {
                    let cached = cache.join(format!("{}.yaml", module.metadata.name));
                    if let Err(e) = std::fs::write(&cached, &text) {
                        tracing::warn!(path = %cached.display(), error = %e, "Failed to cache manifest");
                    }
                    modules.push(self.stamp(module, repo, cached));
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping malformed remote manifest");
                }
            }
        }

        Ok(modules)
    }

    /// Load a repository's modules from its cache directory.
    fn load_cached(&self, repo: &RemoteRepository) -> Vec<Module> {
        let cache = self.repo_cache_dir(repo);
        let Ok(entries) = std::fs::read_dir(&cache) else {
            return Vec::new();
        };

        let mut modules = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match manifest::from_file(&path) {
                Ok(module) => modules.push(self.stamp(module, repo, path)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed cached manifest");
                }
            }
        }
        modules
    }

    fn stamp(&self, mut module: Module, repo: &RemoteRepository, path: PathBuf) -> Module {
        module.path = path;
        module.source = "remote".to_string();
        module.loaded_at = Utc::now();
        module.trusted = repo.trusted || self.allow_untrusted;
        module
    }
}

#[async_trait]
impl DiscoverySource for RemoteSource {
    fn source_type(&self) -> &str {
        "remote"
    }

    async fn discover(&self) -> ModuleResult<Vec<Module>> {
        let mut modules = Vec::new();

        for repo in &self.repositories {
            match self.fetch_repo(repo).await {
                Ok(fetched) => modules.extend(fetched),
                Err(e) => {
                    let cached = self.load_cached(repo);
                    if cached.is_empty() {
                        tracing::warn!(
                            repository = %repo.url,
                            error = %e,
                            "Remote repository unreachable and no cache available"
                        );
                    } else {
                        tracing::warn!(
                            repository = %repo.url,
                            error = %e,
                            count = cached.len(),
                            "Remote repository unreachable, using cached manifests"
                        );
                        modules.extend(cached);
                    }
                }
            }
        }

        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(url: &str, trusted: bool) -> RemoteRepository {
        RemoteRepository { url: url.to_string(), reference: "main".to_string(), trusted }
    }

    fn source_with(temp: &TempDir, repos: Vec<RemoteRepository>, allow_untrusted: bool) -> RemoteSource {
        let config = ModulesConfig {
            repositories: repos,
            cache_dir: Some(temp.path().to_string_lossy().into_owned()),
            allow_untrusted,
            ..ModulesConfig::default()
        };
        RemoteSource::new(&config)
    }

    const CACHED_MANIFEST: &str = r#"
apiVersion: modrun.dev/v1
kind: Module
metadata: {name: remote-tool, version: 2.0.0}
spec:
  type: docker
  docker: {image: example:2}
  commands:
    - name: run
"#;

    #[tokio::test]
    async fn test_unreachable_repo_falls_back_to_cache() {
        let temp = TempDir::new().unwrap();
        let repo = repo("http://127.0.0.1:1/modules", true);
        let source = source_with(&temp, vec![repo.clone()], false);

        let cache = source.repo_cache_dir(&repo);
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("remote-tool.yaml"), CACHED_MANIFEST).unwrap();

        let modules = source.discover().await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].metadata.name, "remote-tool");
        assert_eq!(modules[0].source, "remote");
        assert!(modules[0].trusted);
    }

    #[tokio::test]
    async fn test_unreachable_repo_without_cache_contributes_nothing() {
        let temp = TempDir::new().unwrap();
        let source = source_with(&temp, vec![repo("http://127.0.0.1:1/modules", true)], false);
        let modules = source.discover().await.unwrap();
        assert!(modules.is_empty());
    }

    #[tokio::test]
    async fn test_untrusted_repo_yields_untrusted_modules() {
        let temp = TempDir::new().unwrap();
        let repo = repo("http://127.0.0.1:1/modules", false);
        let source = source_with(&temp, vec![repo.clone()], false);

        let cache = source.repo_cache_dir(&repo);
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("remote-tool.yaml"), CACHED_MANIFEST).unwrap();

        let modules = source.discover().await.unwrap();
        assert!(!modules[0].trusted);
    }

    #[test]
    fn test_cache_key_varies_by_ref() {
        let temp = TempDir::new().unwrap();
        let source = source_with(&temp, vec![], false);

        let a = RemoteRepository {
            url: "https://example.com/mods".into(),
            reference: "main".into(),
            trusted: true,
        };
        let b = RemoteRepository { reference: "v2".into(), ..a.clone() };

        assert_ne!(source.repo_cache_dir(&a), source.repo_cache_dir(&b));
    }
}
