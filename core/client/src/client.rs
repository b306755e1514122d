//! Store client and raw request primitives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use vaultmgr_common::{Error, Result};

use crate::config::ClientConfig;
use crate::secret::Secret;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// Client for a path-addressed secret store.
///
/// Holds no per-path state: every versioned operation re-resolves its mount,
/// so one client can be shared freely across call sites. The only mutable
/// state is the response-wrapping TTL, which version detection suspends for
/// the duration of its introspection request.
pub struct VaultClient {
    transport: Arc<dyn Transport>,
    wrap_ttl: Mutex<Option<String>>,
}

impl VaultClient {
    /// Wrap an existing transport (e.g. [`crate::memory::MemoryTransport`]).
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            wrap_ttl: Mutex::new(None),
        }
    }

    /// Connect to a live store described by `config`.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Request response wrapping with the given TTL on subsequent calls.
    pub fn set_wrap_ttl(&self, ttl: Option<String>) {
        *self.lock_wrap() = ttl;
    }

    /// Current response-wrapping TTL, if any.
    pub fn wrap_ttl(&self) -> Option<String> {
        self.lock_wrap().clone()
    }

    fn lock_wrap(&self) -> MutexGuard<'_, Option<String>> {
        self.wrap_ttl.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend response wrapping until the returned guard drops.
    ///
    /// The prior TTL is restored on every exit path, including early
    /// returns and panics.
    pub(crate) fn suspend_wrapping(&self) -> WrapSuspension<'_> {
        let saved = self.lock_wrap().take();
        WrapSuspension {
            client: self,
            saved,
        }
    }

    /// Issue a request, attaching the current wrapping TTL.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            params,
            body,
            wrap_ttl: self.wrap_ttl(),
        };
        self.transport.send(&request)
    }

    /// Enumerate child keys below a wire path.
    ///
    /// Returns `Ok(None)` when the store has nothing listed there; the
    /// caller decides whether that means "leaf" or "absent". A key ending
    /// in `/` denotes a subtree.
    pub fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        debug!("listing {path}");
        let response = self.request(Method::List, path, Vec::new(), None)?;
        if response.is_absent() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(Error::Transport(format!(
                "error listing {path:?}: status {}: {}",
                response.status,
                response.body.trim()
            )));
        }
        let secret = Secret::parse(&response.body)?;
        let keys = secret
            .as_ref()
            .and_then(|secret| secret.data.get("keys"))
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            });
        Ok(match keys {
            Some(keys) if !keys.is_empty() => Some(keys),
            _ => None,
        })
    }

    /// Delete the secret at a wire path.
    ///
    /// The caller chooses the segment (`metadata` under KV v2) before any
    /// deletion traversal begins. Deleting an absent path succeeds.
    pub fn delete_at(&self, path: &str) -> Result<()> {
        debug!("deleting {path}");
        let response = self.request(Method::Delete, path, Vec::new(), None)?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::Transport(format!(
                "error deleting {path:?}: status {}: {}",
                response.status,
                response.body.trim()
            )))
        }
    }
}

/// Guard that keeps response wrapping disabled while it lives.
pub(crate) struct WrapSuspension<'a> {
    client: &'a VaultClient,
    saved: Option<String>,
}

impl Drop for WrapSuspension<'_> {
    fn drop(&mut self) {
        *self.client.lock_wrap() = self.saved.take();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryTransport;

    #[test]
    fn test_wrap_ttl_attached_to_requests() {
        let store = Arc::new(MemoryTransport::v2("secret"));
        let client = VaultClient::new(store.clone());
        client.set_wrap_ttl(Some("5m".to_string()));

        client
            .request(Method::Get, "secret/data/foo", Vec::new(), None)
            .unwrap();

        let requests = store.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].wrap_ttl.as_deref(), Some("5m"));
    }

    #[test]
    fn test_suspension_removes_and_restores_ttl() {
        let store = Arc::new(MemoryTransport::v2("secret"));
        let client = VaultClient::new(store.clone());
        client.set_wrap_ttl(Some("5m".to_string()));

        {
            let _guard = client.suspend_wrapping();
            assert_eq!(client.wrap_ttl(), None);
            client
                .request(Method::Get, "secret/data/foo", Vec::new(), None)
                .unwrap();
        }

        assert_eq!(client.wrap_ttl().as_deref(), Some("5m"));
        assert_eq!(store.requests()[0].wrap_ttl, None);
    }

    #[test]
    fn test_list_absent_path_is_none() {
        let store = Arc::new(MemoryTransport::v2("secret"));
        let client = VaultClient::new(store);
        assert!(client.list("secret/metadata/nothing").unwrap().is_none());
    }
}
