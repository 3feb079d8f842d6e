use thiserror::Error;

/// Errors shared by backend store clients and the scoping adapter.
///
/// Backend clients report `Connection`, `Fetch`, `Watch` and `Cancelled`; the
/// adapter passes those through unchanged and adds its own variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The version command could not run, or its output had no usable version.
    #[error("version detection failed: {0}")]
    VersionDetection(String),

    /// The scope file is missing, unreadable, or malformed.
    #[error("scope config load failed: {0}")]
    ConfigLoad(String),

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// A backend client could not be constructed (bad endpoints, TLS material, ...).
    #[error("connection error: {0}")]
    Connection(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("watch cancelled")]
    Cancelled,
}
