//! Engine version detection and version-specific wire strategy.

use serde_json::{json, Map, Value};
use tracing::debug;

use vaultmgr_common::{path, Error, Result};

use crate::client::VaultClient;
use crate::secret::Secret;
use crate::transport::Method;

/// KV engine protocol version.
///
/// A closed enumeration: all version-specific behavior (path rewriting,
/// payload enveloping, envelope unwrapping) hangs off the [`Mount`] carrying
/// it, so individual operations never branch on the version themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvVersion {
    V1,
    V2,
}

/// A resolved mount: the root the engine is exposed under plus its version.
///
/// Transient: resolved once per operation and dropped. Callers must treat
/// resolution as a per-call cost, not a persistent binding.
#[derive(Debug, Clone)]
pub struct Mount {
    root: String,
    version: KvVersion,
}

impl Mount {
    /// Determine the engine version governing `logical`.
    ///
    /// A 403/404 from the introspection endpoint is the detection signal for
    /// a legacy v1 engine (older servers have no such endpoint) and succeeds
    /// with an empty mount root. Response wrapping is suspended for the
    /// introspection request and restored afterwards regardless of outcome.
    pub fn detect(client: &VaultClient, logical: &str) -> Result<Self> {
        let introspection = path::join("sys/internal/ui/mounts", logical);
        let response = {
            let _unwrapped = client.suspend_wrapping();
            client.request(Method::Get, &introspection, Vec::new(), None)?
        };

        if response.is_absent() {
            return Ok(Self {
                root: String::new(),
                version: KvVersion::V1,
            });
        }
        if !response.is_success() {
            return Err(Error::Transport(format!(
                "error probing mount for {logical:?}: status {}: {}",
                response.status,
                response.body.trim()
            )));
        }

        let secret = Secret::parse(&response.body)?.unwrap_or_default();
        let root = secret.field_str("path").unwrap_or_default().to_string();
        let version = match secret
            .data
            .get("options")
            .and_then(|options| options.get("version"))
            .and_then(Value::as_str)
        {
            Some("2") => KvVersion::V2,
            _ => KvVersion::V1,
        };
        debug!("resolved mount {root:?} ({version:?}) for {logical}");
        Ok(Self { root, version })
    }

    /// The engine version.
    pub fn version(&self) -> KvVersion {
        self.version
    }

    /// Mount root as reported by the store (empty for legacy engines).
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Wire path for read/write operations.
    pub fn data_path(&self, logical: &str) -> String {
        self.wire_path(logical, "data")
    }

    /// Wire path for delete/list operations.
    pub fn metadata_path(&self, logical: &str) -> String {
        self.wire_path(logical, "metadata")
    }

    fn wire_path(&self, logical: &str, segment: &str) -> String {
        match self.version {
            KvVersion::V1 => logical.to_string(),
            KvVersion::V2 => path::rewrite_under_mount(logical, &self.root, segment),
        }
    }

    /// Envelope a write payload the way this engine version expects.
    pub fn wrap_payload(&self, payload: &Map<String, Value>) -> Value {
        match self.version {
            KvVersion::V1 => Value::Object(payload.clone()),
            KvVersion::V2 => json!({ "data": payload, "options": {} }),
        }
    }

    /// Strip the version envelope from a read response.
    ///
    /// Under V2 the top-level `data` field carries `{data, metadata}`; the
    /// inner mapping replaces the secret's data when it is an object, and
    /// the secret passes through untouched otherwise.
    pub fn unwrap_secret(&self, mut secret: Secret) -> Secret {
        if self.version == KvVersion::V2 {
            let inner = match secret.data.get("data") {
                Some(Value::Object(inner)) => Some(inner.clone()),
                _ => None,
            };
            if let Some(inner) = inner {
                secret.data = inner;
            }
        }
        secret
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryTransport;

    fn client_for(store: MemoryTransport) -> (Arc<MemoryTransport>, VaultClient) {
        let store = Arc::new(store);
        (store.clone(), VaultClient::new(store))
    }

    #[test]
    fn test_detect_v2() {
        let (_, client) = client_for(MemoryTransport::v2("secret"));
        let mount = Mount::detect(&client, "secret/app/db").unwrap();
        assert_eq!(mount.version(), KvVersion::V2);
        assert_eq!(mount.root(), "secret/");
    }

    #[test]
    fn test_detect_v1() {
        let (_, client) = client_for(MemoryTransport::v1("kv"));
        let mount = Mount::detect(&client, "kv/app/db").unwrap();
        assert_eq!(mount.version(), KvVersion::V1);
        assert_eq!(mount.root(), "kv/");
    }

    #[test]
    fn test_detect_legacy_falls_back_to_v1() {
        // Older servers have no introspection endpoint; the 404 is the
        // detection signal, not an error.
        let (_, client) = client_for(MemoryTransport::legacy("kv"));
        let mount = Mount::detect(&client, "kv/app/db").unwrap();
        assert_eq!(mount.version(), KvVersion::V1);
        assert_eq!(mount.root(), "");
    }

    #[test]
    fn test_detect_server_error_is_transport_error() {
        let (store, client) = client_for(MemoryTransport::v2("secret"));
        store.respond_with(
            "sys/internal/ui/mounts/secret/app",
            500,
            r#"{"errors":["internal error"]}"#,
        );
        let err = Mount::detect(&client, "secret/app").unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("secret/app"));
    }

    #[test]
    fn test_detect_suspends_wrapping_even_on_failure() {
        let (store, client) = client_for(MemoryTransport::v2("secret"));
        store.respond_with("sys/internal/ui/mounts/secret/app", 500, "");
        client.set_wrap_ttl(Some("10m".to_string()));

        let _ = Mount::detect(&client, "secret/app");

        assert_eq!(client.wrap_ttl().as_deref(), Some("10m"));
        let introspection = &store.requests()[0];
        assert_eq!(introspection.wrap_ttl, None);
    }

    #[test]
    fn test_wire_paths_per_version() {
        let v2 = Mount {
            root: "secret/".to_string(),
            version: KvVersion::V2,
        };
        assert_eq!(v2.data_path("secret/app/db"), "secret/data/app/db");
        assert_eq!(v2.metadata_path("secret/app/db"), "secret/metadata/app/db");
        assert_eq!(v2.data_path("secret"), "secret/data");

        let v1 = Mount {
            root: String::new(),
            version: KvVersion::V1,
        };
        assert_eq!(v1.data_path("kv/app/db"), "kv/app/db");
        assert_eq!(v1.metadata_path("kv/app/db"), "kv/app/db");
    }

    #[test]
    fn test_unwrap_replaces_data_only_when_inner_is_object() {
        let v2 = Mount {
            root: "secret/".to_string(),
            version: KvVersion::V2,
        };

        let enveloped =
            Secret::parse(r#"{"data":{"data":{"user":"svc"},"metadata":{"version":3}}}"#)
                .unwrap()
                .unwrap();
        let secret = v2.unwrap_secret(enveloped);
        assert_eq!(secret.field_str("user"), Some("svc"));
        assert!(secret.data.get("metadata").is_none());

        let flat = Secret::parse(r#"{"data":{"data":"not a map"}}"#)
            .unwrap()
            .unwrap();
        let secret = v2.unwrap_secret(flat);
        assert_eq!(secret.field_str("data"), Some("not a map"));
    }
}
