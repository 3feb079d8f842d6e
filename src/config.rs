use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StoreError;
use crate::scope::{DEFAULT_SCOPE_PATH, FileScopeLoader};
use crate::selector::{BackendKind, CommandProbe};

/// Adapter configuration.
///
/// Every field has a default, so an empty file (or `Default::default()`)
/// reproduces the stock node setup: scope from `/etc/etcd/etcd.client.conf`,
/// backend picked from `sdcctl --version`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScopedClientConfig {
    /// Scope file, re-read on every fetch.
    pub scope_path: PathBuf,
    /// Program that reports the control-plane version.
    pub version_command: String,
    pub version_args: Vec<String>,
    /// Skip version detection and use this backend (`"etcd"` or `"etcdv3"`).
    pub backend: Option<String>,
}

impl Default for ScopedClientConfig {
    fn default() -> Self {
        Self {
            scope_path: PathBuf::from(DEFAULT_SCOPE_PATH),
            version_command: "sdcctl".to_string(),
            version_args: vec!["--version".to_string()],
            backend: None,
        }
    }
}

impl ScopedClientConfig {
    /// Parse a TOML configuration document.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        toml::from_str(text).map_err(|e| StoreError::ConfigLoad(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path)
            .map_err(|e| StoreError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// The configured backend override, if any. An unknown name is an
    /// `UnsupportedBackend` error.
    pub fn backend_override(&self) -> Result<Option<BackendKind>, StoreError> {
        self.backend.as_deref().map(str::parse::<BackendKind>).transpose()
    }

    pub fn scope_loader(&self) -> FileScopeLoader {
        FileScopeLoader::new(&self.scope_path)
    }

    pub fn version_probe(&self) -> CommandProbe {
        CommandProbe::new(&self.version_command, &self.version_args)
    }
}
