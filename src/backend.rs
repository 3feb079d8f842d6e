use std::fmt;

use serde::Deserialize;

use crate::error::StoreError;
use crate::selector::BackendKind;
use crate::traits::StoreClient;

/// Connection parameters handed verbatim to whichever backend client is built.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientParams {
    /// Backend endpoints, e.g. `http://127.0.0.1:2379`.
    pub machines: Vec<String>,
    /// TLS client certificate path.
    pub cert: Option<String>,
    /// TLS client key path.
    pub key: Option<String>,
    /// TLS CA certificate path.
    pub ca_cert: Option<String>,
    pub basic_auth: bool,
    pub username: String,
    pub password: String,
}

impl ClientParams {
    pub fn new<I, S>(machines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            machines: machines.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_tls(
        mut self,
        cert: impl Into<String>,
        key: impl Into<String>,
        ca_cert: impl Into<String>,
    ) -> Self {
        self.cert = Some(cert.into());
        self.key = Some(key.into());
        self.ca_cert = Some(ca_cert.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = true;
        self.username = username.into();
        self.password = password.into();
        self
    }
}

impl fmt::Debug for ClientParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientParams")
            .field("machines", &self.machines)
            .field("cert", &self.cert)
            .field("key", &self.key)
            .field("ca_cert", &self.ca_cert)
            .field("basic_auth", &self.basic_auth)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// BackendConnector builds the concrete etcd or etcdv3 client.
///
/// Construction errors are returned as-is; the adapter does not wrap them.
pub trait BackendConnector {
    fn connect(
        &self,
        kind: BackendKind,
        params: &ClientParams,
    ) -> Result<Box<dyn StoreClient>, StoreError>;
}

impl<F> BackendConnector for F
where
    F: Fn(BackendKind, &ClientParams) -> Result<Box<dyn StoreClient>, StoreError>,
{
    fn connect(
        &self,
        kind: BackendKind,
        params: &ClientParams,
    ) -> Result<Box<dyn StoreClient>, StoreError> {
        self(kind, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let params = ClientParams::new(["http://127.0.0.1:2379"]).with_basic_auth("root", "hunter2");
        let printed = format!("{:?}", params);
        assert!(printed.contains("root"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn builders_fill_fields() {
        let params = ClientParams::new(["https://etcd-0:2379", "https://etcd-1:2379"])
            .with_tls("/tls/client.crt", "/tls/client.key", "/tls/ca.crt");
        assert_eq!(params.machines.len(), 2);
        assert_eq!(params.ca_cert.as_deref(), Some("/tls/ca.crt"));
        assert!(!params.basic_auth);
    }

    #[test]
    fn deserializes_with_defaults() {
        let params: ClientParams = toml::from_str(
            r#"
            machines = ["http://10.0.0.5:2379"]
            basic_auth = true
            username = "conf"
            "#,
        )
        .unwrap();
        assert_eq!(params.machines, vec!["http://10.0.0.5:2379".to_string()]);
        assert!(params.basic_auth);
        assert_eq!(params.password, "");
        assert!(params.cert.is_none());
    }
}
