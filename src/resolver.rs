//! Key scoping: turns logical keys into the scope-qualified backend paths
//! they may live under, and merges backend replies.
//!
//! A logical key such as `/myapp/db/host` is first normalized against the
//! scope's system name (`/db/host`), then expanded:
//!
//! ```text
//! /config/db/host  → /myapp/config/db/host
//!                    /myapp/node1/config/db/host
//!
//! /db/host         → /myapp/config/db/host
//!                    /myapp/services/db/host
//!                    /myapp/node1/config/db/host
//!                    /myapp/node1/services/db/host
//! ```

use std::slice;

use tracing::debug;

use crate::error::StoreError;
use crate::scope::Scope;
use crate::traits::{ResultMap, StoreClient};

/// Top-level namespace a scoped key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Config,
    Services,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Config, Namespace::Services];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Config => "config",
            Namespace::Services => "services",
        }
    }

    /// Namespace named by the first segment of a normalized key, if any.
    /// Keys too short to carry a namespace segment yield `None`.
    pub fn of(normalized: &str) -> Option<Namespace> {
        match normalized.split('/').nth(1) {
            Some("config") => Some(Namespace::Config),
            Some("services") => Some(Namespace::Services),
            _ => None,
        }
    }
}

/// Strip empty segments and segments equal to `system`, and rejoin the rest
/// with a leading `/`. An input with nothing left normalizes to `""`.
pub fn normalize(key: &str, system: &str) -> String {
    let mut normalized = String::with_capacity(key.len());
    for segment in key.split('/').filter(|s| !s.is_empty() && *s != system) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// Scoped paths to query for one logical key, system scope before local.
///
/// Keys already under `config` or `services` get two candidates; any other
/// key (including one too short to name a namespace) gets four.
pub fn candidates(key: &str, scope: &Scope) -> Vec<String> {
    let normalized = normalize(key, &scope.system);
    let system = format!("/{}", scope.system);
    let local = format!("/{}/{}", scope.system, scope.local);

    if Namespace::of(&normalized).is_some() {
        return vec![
            format!("{}{}", system, normalized),
            format!("{}{}", local, normalized),
        ];
    }

    let mut out = Vec::with_capacity(4);
    for base in [&system, &local] {
        for ns in Namespace::ALL {
            out.push(format!("{}/{}{}", base, ns.as_str(), normalized));
        }
    }
    out
}

/// Candidates for every key, in input order.
pub fn expand_all(keys: &[String], scope: &Scope) -> Vec<String> {
    keys.iter().flat_map(|key| candidates(key, scope)).collect()
}

/// How scoped candidates are sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One request for all candidates; the reply is returned as-is.
    Batched,
    /// One request per candidate, merged best-effort.
    PerCandidate,
}

impl FetchMode {
    pub fn fetch(
        self,
        client: &dyn StoreClient,
        keys: &[String],
        scope: &Scope,
    ) -> Result<ResultMap, StoreError> {
        match self {
            FetchMode::Batched => fetch_batched(client, keys, scope),
            FetchMode::PerCandidate => Ok(fetch_per_candidate(client, keys, scope)),
        }
    }
}

/// Query all candidates of all keys in a single request. The reply is keyed
/// by scoped path and is not remapped. A backend error is returned unchanged.
pub fn fetch_batched(
    client: &dyn StoreClient,
    keys: &[String],
    scope: &Scope,
) -> Result<ResultMap, StoreError> {
    let scoped = expand_all(keys, scope);
    debug!("batched fetch: {} keys → {} scoped paths", keys.len(), scoped.len());
    client.get_values(&scoped)
}

/// Query each candidate on its own, in order, and merge the replies.
///
/// Best-effort merge: a candidate whose fetch fails is left out of the
/// result and the error is not reported. Every candidate that fetched
/// successfully gets an entry: the exact scoped key from the reply, or `""`
/// when the reply does not hold it.
pub fn fetch_per_candidate(client: &dyn StoreClient, keys: &[String], scope: &Scope) -> ResultMap {
    let mut result = ResultMap::new();
    for key in keys {
        for candidate in candidates(key, scope) {
            match client.get_values(slice::from_ref(&candidate)) {
                Ok(mut values) => {
                    let value = values.remove(&candidate).unwrap_or_default();
                    result.insert(candidate, value);
                }
                Err(e) => debug!("skipping {}: {}", candidate, e),
            }
        }
    }
    result
}
