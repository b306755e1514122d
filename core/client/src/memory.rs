//! In-memory transport for testing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{json, Map, Value};

use vaultmgr_common::{path, Result};

use crate::mount::KvVersion;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

const INTROSPECTION_PREFIX: &str = "sys/internal/ui/mounts/";

/// In-memory secret engine implementing [`Transport`].
///
/// Simulates a single KV mount in either protocol version, including the
/// mount-introspection endpoint, v2 path segments and envelopes, and the
/// overloaded 403/404 statuses. Useful for testing and development; all
/// data is lost on drop.
///
/// The transport records every request and every delete (in order) and can
/// inject failures or canned responses for specific paths.
pub struct MemoryTransport {
    version: KvVersion,
    /// Mount root with trailing slash, as the introspection endpoint
    /// reports it.
    mount_root: String,
    /// When set, the introspection endpoint itself 404s, simulating a
    /// server that predates it.
    legacy_introspection: bool,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    secrets: BTreeMap<String, Map<String, Value>>,
    deletes: Vec<String>,
    requests: Vec<ApiRequest>,
    canned: HashMap<String, (u16, String)>,
    fail_delete: HashSet<String>,
    fail_list: HashSet<String>,
}

impl MemoryTransport {
    fn with_version(mount: &str, version: KvVersion, legacy_introspection: bool) -> Self {
        Self {
            version,
            mount_root: format!("{}/", path::normalize(mount)),
            legacy_introspection,
            state: Mutex::new(State::default()),
        }
    }

    /// A versioned (v2) engine mounted at `mount`.
    pub fn v2(mount: &str) -> Self {
        Self::with_version(mount, KvVersion::V2, false)
    }

    /// A flat (v1) engine mounted at `mount`.
    pub fn v1(mount: &str) -> Self {
        Self::with_version(mount, KvVersion::V1, false)
    }

    /// A flat engine on a server too old to have the introspection
    /// endpoint at all.
    pub fn legacy(mount: &str) -> Self {
        Self::with_version(mount, KvVersion::V1, true)
    }

    /// Seed a secret at a logical path (mount included, e.g. `secret/foo`).
    pub fn insert(&self, logical: &str, data: Map<String, Value>) {
        self.lock().secrets.insert(path::normalize(logical), data);
    }

    /// Whether a secret currently exists at the logical path.
    pub fn contains(&self, logical: &str) -> bool {
        self.lock().secrets.contains_key(&path::normalize(logical))
    }

    /// Current payload at a logical path.
    pub fn secret(&self, logical: &str) -> Option<Map<String, Value>> {
        self.lock().secrets.get(&path::normalize(logical)).cloned()
    }

    /// Logical paths deleted so far, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deletes.clone()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Serve a canned response for an exact wire path, bypassing the store.
    pub fn respond_with(&self, wire_path: &str, status: u16, body: &str) {
        self.lock()
            .canned
            .insert(wire_path.to_string(), (status, body.to_string()));
    }

    /// Make deletes of the given logical path fail with a server error.
    pub fn fail_delete_of(&self, logical: &str) {
        self.lock().fail_delete.insert(path::normalize(logical));
    }

    /// Make listings of the given logical path fail with a server error.
    pub fn fail_list_of(&self, logical: &str) {
        self.lock().fail_list.insert(path::normalize(logical));
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Translate a wire path back to the logical storage key, validating
    /// the v2 API segment.
    fn storage_key(&self, wire: &str) -> Option<String> {
        let root = self.mount_root.trim_end_matches('/');
        let rest = path::normalize(wire);
        let rest = rest.strip_prefix(root)?;
        let rest = rest.trim_start_matches('/');
        match self.version {
            KvVersion::V1 => Some(path::join(root, rest)),
            KvVersion::V2 => {
                let (segment, tail) = rest.split_once('/').unwrap_or((rest, ""));
                if segment == "data" || segment == "metadata" {
                    Some(path::join(root, tail))
                } else {
                    None
                }
            }
        }
    }

    fn introspection_response(&self) -> ApiResponse {
        if self.legacy_introspection {
            return not_found();
        }
        let options = match self.version {
            KvVersion::V1 => Value::Null,
            KvVersion::V2 => json!({ "version": "2" }),
        };
        ok(json!({ "data": { "path": self.mount_root, "options": options } }))
    }

    fn get(&self, key: &str) -> ApiResponse {
        match self.lock().secrets.get(key) {
            Some(data) => match self.version {
                KvVersion::V1 => ok(json!({ "data": data })),
                KvVersion::V2 => ok(json!({
                    "data": {
                        "data": data,
                        "metadata": { "version": 1, "destroyed": false, "deletion_time": "" },
                    }
                })),
            },
            None => not_found(),
        }
    }

    fn put(&self, key: &str, body: Option<&Value>) -> ApiResponse {
        let payload = match self.version {
            KvVersion::V1 => body.and_then(Value::as_object).cloned(),
            KvVersion::V2 => body
                .and_then(|body| body.get("data"))
                .and_then(Value::as_object)
                .cloned(),
        };
        let Some(payload) = payload else {
            return error_status(400, "invalid write payload");
        };
        self.lock().secrets.insert(key.to_string(), payload);
        match self.version {
            KvVersion::V1 => ApiResponse {
                status: 204,
                body: String::new(),
            },
            KvVersion::V2 => ok(json!({ "data": { "metadata": { "version": 1 } } })),
        }
    }

    fn list(&self, key: &str) -> ApiResponse {
        let state = self.lock();
        if state.fail_list.contains(key) {
            return error_status(500, "simulated list failure");
        }
        let prefix = format!("{key}/");
        let mut children = BTreeSet::new();
        for stored in state.secrets.keys() {
            if let Some(rest) = stored.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((head, _)) => children.insert(format!("{head}/")),
                    None => children.insert(rest.to_string()),
                };
            }
        }
        if children.is_empty() {
            return not_found();
        }
        let keys: Vec<Value> = children.into_iter().map(Value::String).collect();
        ok(json!({ "data": { "keys": keys } }))
    }

    fn delete(&self, key: &str) -> ApiResponse {
        let mut state = self.lock();
        if state.fail_delete.contains(key) {
            return error_status(500, "simulated delete failure");
        }
        state.deletes.push(key.to_string());
        state.secrets.remove(key);
        ApiResponse {
            status: 204,
            body: String::new(),
        }
    }
}

impl Transport for MemoryTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.lock().requests.push(request.clone());

        if let Some((status, body)) = self.lock().canned.get(&request.path).cloned() {
            return Ok(ApiResponse { status, body });
        }
        if request.path.starts_with(INTROSPECTION_PREFIX) {
            return Ok(self.introspection_response());
        }

        let Some(key) = self.storage_key(&request.path) else {
            return Ok(not_found());
        };
        Ok(match request.method {
            Method::Get => self.get(&key),
            Method::Post => self.put(&key, request.body.as_ref()),
            Method::List => self.list(&key),
            Method::Delete => self.delete(&key),
        })
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: body.to_string(),
    }
}

fn not_found() -> ApiResponse {
    ApiResponse {
        status: 404,
        body: r#"{"errors":[]}"#.to_string(),
    }
}

fn error_status(status: u16, message: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: json!({ "errors": [message] }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            path: path.to_string(),
            params: Vec::new(),
            body: None,
            wrap_ttl: None,
        }
    }

    fn data() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("k".to_string(), Value::String("v".to_string()));
        map
    }

    #[test]
    fn test_list_distinguishes_leaves_and_subtrees() {
        let store = MemoryTransport::v2("secret");
        store.insert("secret/a/b", data());
        store.insert("secret/a/c/d", data());

        let response = store
            .send(&request(Method::List, "secret/metadata/a"))
            .unwrap();
        assert_eq!(response.status, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"]["keys"], json!(["b", "c/"]));
    }

    #[test]
    fn test_v2_rejects_unsegmented_paths() {
        let store = MemoryTransport::v2("secret");
        store.insert("secret/a", data());
        let response = store.send(&request(Method::Get, "secret/a")).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_v1_get_returns_flat_data() {
        let store = MemoryTransport::v1("kv");
        store.insert("kv/a", data());
        let response = store.send(&request(Method::Get, "kv/a")).unwrap();
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"]["k"], json!("v"));
    }
}
