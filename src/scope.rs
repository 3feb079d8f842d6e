use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;

/// Well-known location of the node's scope file.
pub const DEFAULT_SCOPE_PATH: &str = "/etc/etcd/etcd.client.conf";

/// Scope identifies the application (system) and the node (local) a key
/// lookup runs for. It is loaded per fetch and dropped afterwards.
///
/// On disk it is a TOML file with two flat fields:
///
/// ```text
/// SYSTEM_NAME = "myapp"
/// NODE_NAME = "node1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scope {
    #[serde(rename = "SYSTEM_NAME")]
    pub system: String,
    #[serde(rename = "NODE_NAME")]
    pub local: String,
}

impl Scope {
    /// Build a scope, rejecting empty names and names containing `/`.
    pub fn new(system: impl Into<String>, local: impl Into<String>) -> Result<Self, StoreError> {
        Self {
            system: system.into(),
            local: local.into(),
        }
        .validated()
    }

    /// Parse the TOML scope file contents. Unknown fields are ignored.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let scope: Scope =
            toml::from_str(text).map_err(|e| StoreError::ConfigLoad(e.to_string()))?;
        scope.validated()
    }

    fn validated(self) -> Result<Self, StoreError> {
        for (field, value) in [("SYSTEM_NAME", &self.system), ("NODE_NAME", &self.local)] {
            if value.is_empty() {
                return Err(StoreError::ConfigLoad(format!("{} is empty", field)));
            }
            if value.contains('/') {
                return Err(StoreError::ConfigLoad(format!(
                    "{} must not contain '/': {:?}",
                    field, value
                )));
            }
        }
        Ok(self)
    }
}

/// ScopeLoader produces a fresh `Scope` for each fetch.
pub trait ScopeLoader: Send + Sync {
    fn load(&self) -> Result<Scope, StoreError>;
}

/// Reads the scope from a TOML file every time `load` is called.
#[derive(Debug, Clone)]
pub struct FileScopeLoader {
    path: PathBuf,
}

impl FileScopeLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileScopeLoader {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPE_PATH)
    }
}

impl ScopeLoader for FileScopeLoader {
    fn load(&self) -> Result<Scope, StoreError> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::ConfigLoad(format!("{}: {}", self.path.display(), e))
        })?;
        let scope = Scope::parse(&text).map_err(|e| match e {
            StoreError::ConfigLoad(msg) => {
                StoreError::ConfigLoad(format!("{}: {}", self.path.display(), msg))
            }
            other => other,
        })?;
        debug!(
            "loaded scope system={} local={} from {:?}",
            scope.system, scope.local, self.path
        );
        Ok(scope)
    }
}

/// Always yields the same scope. Used when the scope is known up front.
#[derive(Debug, Clone)]
pub struct StaticScopeLoader(Scope);

impl StaticScopeLoader {
    pub fn new(scope: Scope) -> Self {
        Self(scope)
    }
}

impl ScopeLoader for StaticScopeLoader {
    fn load(&self) -> Result<Scope, StoreError> {
        Ok(self.0.clone())
    }
}
