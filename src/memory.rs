use std::collections::BTreeMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ResultMap, StoreClient};

/// How often a blocked watch re-checks its cancellation token.
const WATCH_POLL: Duration = Duration::from_millis(20);

/// Default number of delete markers kept before the oldest half is compacted.
const DEFAULT_TOMBSTONE_LIMIT: usize = 1024;

#[derive(Default)]
struct State {
    /// key → (value, index of last write)
    entries: BTreeMap<String, (String, u64)>,
    /// deleted key → index of the delete
    tombstones: BTreeMap<String, u64>,
    /// Highest delete index dropped by compaction.
    compacted: u64,
    index: u64,
}

impl State {
    fn changed_since(&self, prefix: &str, wait_index: u64) -> bool {
        // Deletes at or below `compacted` are forgotten; a watcher that may
        // have missed one is woken so it refetches.
        if wait_index < self.compacted {
            return true;
        }
        let live = self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .any(|(_, (_, idx))| *idx > wait_index);
        live || self
            .tombstones
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .any(|(_, idx)| *idx > wait_index)
    }

    /// Keep at most `limit` delete markers by dropping the oldest ones.
    fn compact(&mut self, limit: usize) {
        if self.tombstones.len() <= limit {
            return;
        }
        let mut indexes: Vec<u64> = self.tombstones.values().copied().collect();
        indexes.sort_unstable();
        let cutoff = indexes[indexes.len() - limit / 2 - 1];
        self.tombstones.retain(|_, idx| *idx > cutoff);
        self.compacted = self.compacted.max(cutoff);
        debug!("compacted delete markers up to index {}", cutoff);
    }
}

/// MemoryStore is an in-process backend with etcd-like read and watch
/// behavior:
///
/// - `get_values` treats each key as a prefix and returns every entry below it.
/// - Each write bumps a store-wide index; `watch_prefix` blocks until a key
///   under the prefix was written or deleted after the caller's index.
/// - Delete markers are bounded. Past the limit the oldest half is dropped,
///   and a watch from an index older than the dropped deletes returns at once.
pub struct MemoryStore {
    state: Mutex<State>,
    changed: Condvar,
    tombstone_limit: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_tombstone_limit(DEFAULT_TOMBSTONE_LIMIT)
    }

    /// Empty store keeping at most `limit` delete markers (minimum 1).
    pub fn with_tombstone_limit(limit: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
            tombstone_limit: limit.max(1),
        }
    }

    /// Build a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (key, value) in entries {
            store.set(key, value)?;
        }
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Connection(format!("memory store poisoned: {}", e)))
    }

    /// Write a value and return the new store index.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<u64, StoreError> {
        let key = key.into();
        let mut state = self.lock()?;
        state.index += 1;
        let index = state.index;
        state.tombstones.remove(&key);
        state.entries.insert(key, (value.into(), index));
        drop(state);
        self.changed.notify_all();
        Ok(index)
    }

    /// Remove a key. Returns the new store index, or `None` if the key was absent.
    pub fn delete(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut state = self.lock()?;
        if state.entries.remove(key).is_none() {
            return Ok(None);
        }
        state.index += 1;
        let index = state.index;
        state.tombstones.insert(key.to_string(), index);
        state.compact(self.tombstone_limit);
        drop(state);
        self.changed.notify_all();
        Ok(Some(index))
    }

    /// Current store index (0 for a store that was never written).
    pub fn index(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.index)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MemoryStore {
    fn get_values(&self, keys: &[String]) -> Result<ResultMap, StoreError> {
        let state = self.lock()?;
        let mut result = ResultMap::new();
        for key in keys {
            for (k, (value, _)) in state
                .entries
                .range(key.clone()..)
                .take_while(|(k, _)| k.starts_with(key.as_str()))
            {
                result.insert(k.clone(), value.clone());
            }
        }
        Ok(result)
    }

    fn watch_prefix(
        &self,
        prefix: &str,
        _keys: &[String],
        wait_index: u64,
        stop: &CancellationToken,
    ) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        // First call: report the current index so the caller does an initial fetch.
        if wait_index == 0 {
            return Ok(state.index);
        }

        debug!("watching {} past index {}", prefix, wait_index);
        loop {
            if stop.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            if state.changed_since(prefix, wait_index) {
                return Ok(state.index);
            }
            let (next, _) = self
                .changed
                .wait_timeout(state, WATCH_POLL)
                .map_err(|e| StoreError::Watch(format!("memory store poisoned: {}", e)))?;
            state = next;
        }
    }
}
