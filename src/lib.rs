pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod scope;
pub mod selector;
pub mod traits;

pub use backend::{BackendConnector, ClientParams};
pub use client::ScopedStoreClient;
pub use config::ScopedClientConfig;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use resolver::{FetchMode, Namespace};
pub use scope::{FileScopeLoader, Scope, ScopeLoader, StaticScopeLoader};
pub use selector::{BackendKind, CommandProbe, SdcVersion, VersionProbe};
pub use traits::{ResultMap, StoreClient};
