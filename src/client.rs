use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::{BackendConnector, ClientParams};
use crate::config::ScopedClientConfig;
use crate::error::StoreError;
use crate::resolver::FetchMode;
use crate::scope::ScopeLoader;
use crate::selector::{BackendKind, SdcVersion, VersionProbe, select_backend};
use crate::traits::{ResultMap, StoreClient};

/// ScopedStoreClient resolves logical keys against the node's scope before
/// querying the underlying etcd or etcdv3 client.
///
/// The backend is chosen once, at construction. The scope is loaded again on
/// every `get_values` call, so edits to the scope file apply to the next
/// fetch. Watches are forwarded untouched: callers pass scoped keys.
pub struct ScopedStoreClient {
    inner: Box<dyn StoreClient>,
    backend: BackendKind,
    mode: FetchMode,
    version: Option<SdcVersion>,
    scope: Box<dyn ScopeLoader>,
}

impl ScopedStoreClient {
    /// Build from configuration: detect the backend (unless overridden),
    /// then connect with `params`.
    pub fn new<C>(
        params: &ClientParams,
        config: &ScopedClientConfig,
        connector: &C,
    ) -> Result<Self, StoreError>
    where
        C: BackendConnector + ?Sized,
    {
        let loader = Box::new(config.scope_loader());
        match config.backend_override()? {
            Some(kind) => {
                info!("using configured {} backend, skipping version detection", kind);
                let inner = connector.connect(kind, params)?;
                Ok(Self::with_parts(inner, kind, loader))
            }
            None => Self::detect(params, &config.version_probe(), loader, connector),
        }
    }

    /// Build by running `probe` once to pick the backend.
    pub fn detect<C>(
        params: &ClientParams,
        probe: &dyn VersionProbe,
        scope: Box<dyn ScopeLoader>,
        connector: &C,
    ) -> Result<Self, StoreError>
    where
        C: BackendConnector + ?Sized,
    {
        let (kind, version) = select_backend(probe)?;
        let inner = connector.connect(kind, params)?;
        let mut client = Self::with_parts(inner, kind, scope);
        client.version = Some(version);
        Ok(client)
    }

    /// Wrap an already constructed backend client.
    pub fn with_parts(
        inner: Box<dyn StoreClient>,
        backend: BackendKind,
        scope: Box<dyn ScopeLoader>,
    ) -> Self {
        Self {
            inner,
            backend,
            mode: backend.fetch_mode(),
            version: None,
            scope,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Detected `sdcctl` version; `None` when the backend was given explicitly.
    pub fn version(&self) -> Option<SdcVersion> {
        self.version
    }
}

impl StoreClient for ScopedStoreClient {
    /// Resolve `keys` under the current scope and fetch them.
    ///
    /// The result is keyed by scoped path. With the etcd backend a candidate
    /// that fails to fetch is silently left out.
    fn get_values(&self, keys: &[String]) -> Result<ResultMap, StoreError> {
        let scope = self.scope.load()?;
        debug!(
            "get_values: {} keys, system={} local={} backend={}",
            keys.len(),
            scope.system,
            scope.local,
            self.backend
        );
        self.mode.fetch(self.inner.as_ref(), keys, &scope)
    }

    fn watch_prefix(
        &self,
        prefix: &str,
        keys: &[String],
        wait_index: u64,
        stop: &CancellationToken,
    ) -> Result<u64, StoreError> {
        self.inner.watch_prefix(prefix, keys, wait_index, stop)
    }
}
