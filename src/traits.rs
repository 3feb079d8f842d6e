use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Key → value mapping returned by a fetch.
pub type ResultMap = BTreeMap<String, String>;

/// StoreClient retrieves key/value pairs from a backend store.
///
/// Keys are slash-delimited paths: `/myapp/config/db/host`. Both backend
/// clients (etcd, etcdv3) and the scoping adapter implement this contract.
pub trait StoreClient: Send + Sync {
    /// Fetch the values for the given keys. Backends treat each key as a
    /// prefix, so the result may hold entries below the requested keys.
    fn get_values(&self, keys: &[String]) -> Result<ResultMap, StoreError>;

    /// Block until something under `prefix` changes past `wait_index`, then
    /// return the new index. Returns `StoreError::Cancelled` once `stop` fires.
    fn watch_prefix(
        &self,
        prefix: &str,
        keys: &[String],
        wait_index: u64,
        stop: &CancellationToken,
    ) -> Result<u64, StoreError>;
}

impl<T: StoreClient + ?Sized> StoreClient for Arc<T> {
    fn get_values(&self, keys: &[String]) -> Result<ResultMap, StoreError> {
        (**self).get_values(keys)
    }

    fn watch_prefix(
        &self,
        prefix: &str,
        keys: &[String],
        wait_index: u64,
        stop: &CancellationToken,
    ) -> Result<u64, StoreError> {
        (**self).watch_prefix(prefix, keys, wait_index, stop)
    }
}
