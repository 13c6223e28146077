//! Run configuration.
//!
//! Configuration is loaded from a TOML file (`kiln.toml` by convention) and
//! then overridden field by field from CLI flags. Every field has a default
//! so a minimal file only needs the namespace.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registry endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Registry address, e.g. `registry.example.com:5000`.
    pub address: String,
    /// Username for `login`; anonymous push when absent.
    #[serde(default)]
    pub username: Option<String>,
    /// Password or token for `login`.
    #[serde(default)]
    pub password: Option<String>,
    /// Allow plain-HTTP/self-signed registries.
    #[serde(default)]
    pub insecure: bool,
}

/// Configuration for one build run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Namespace all component images are built under.
    pub namespace: String,
    /// Tag applied to every image built this run.
    pub tag: String,
    /// Directory containing one subdirectory per component.
    pub components_root: PathBuf,
    /// Directory where rendered build contexts are placed.
    pub context_root: PathBuf,
    /// Build-definition filename stem looked for in each component
    /// directory (any file whose name starts with this matches).
    pub definition_stem: String,
    /// Worker pool size; 0 means one per available core.
    pub workers: usize,
    /// Pass `--no-cache` to the runtime on every build.
    pub no_cache: bool,
    /// Push images after a successful build.
    pub push: bool,
    /// Auto-match missing ancestors of requested images.
    pub backfill_ancestors: bool,
    /// Rebuild already-present descendants when their parent is rebuilt.
    pub cascade_descendants: bool,
    /// Skip components without a build definition instead of failing.
    pub skip_missing: bool,
    /// Tolerate undefined template variables instead of failing the render.
    pub permissive_render: bool,
    /// Target registry; required for pushing to a non-default registry.
    pub registry: Option<RegistryConfig>,
    /// Variables made available to definition templates.
    pub variables: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            namespace: "kiln".to_string(),
            tag: "latest".to_string(),
            components_root: PathBuf::from("components"),
            context_root: PathBuf::from(".kiln/contexts"),
            definition_stem: "Dockerfile".to_string(),
            workers: 0,
            no_cache: false,
            push: false,
            backfill_ancestors: true,
            cascade_descendants: true,
            skip_missing: false,
            permissive_render: false,
            registry: None,
            variables: BTreeMap::new(),
        }
    }
}

impl BuildConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Effective worker pool size.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(1)
        } else {
            self.workers
        }
    }

    /// Registry prefix for fully qualified tags.
    ///
    /// Present only when pushing is enabled and a registry is configured;
    /// local-only builds keep unprefixed tags.
    #[must_use]
    pub fn registry_prefix(&self) -> Option<&str> {
        if self.push {
            self.registry.as_ref().map(|r| r.address.as_str())
        } else {
            None
        }
    }

    /// The fully qualified tag a component image is built and pushed under.
    #[must_use]
    pub fn full_tag(&self, name: &str) -> String {
        match self.registry_prefix() {
            Some(registry) => format!("{}/{}/{}:{}", registry, self.namespace, name, self.tag),
            None => format!("{}/{}:{}", self.namespace, name, self.tag),
        }
    }
}
