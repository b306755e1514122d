//! Versioned read/write access to secrets.

use serde_json::{Map, Value};
use tracing::debug;

use vaultmgr_common::{Error, Result};

use crate::client::VaultClient;
use crate::mount::{KvVersion, Mount};
use crate::secret::Secret;
use crate::transport::Method;

impl VaultClient {
    /// Read the secret at `path`.
    ///
    /// `version` selects a specific KV v2 secret version; `None` or zero
    /// mean "latest" and omit the selector entirely. Under v1 the selector
    /// is never sent. Returns `Ok(None)` when nothing exists at the path;
    /// absence is an expected outcome, not an error.
    pub fn read(&self, path: &str, version: Option<u64>) -> Result<Option<Secret>> {
        let mount = Mount::detect(self, path)?;
        let wire = mount.data_path(path);

        let mut params = Vec::new();
        if mount.version() == KvVersion::V2 {
            if let Some(v) = version.filter(|v| *v > 0) {
                params.push(("version".to_string(), v.to_string()));
            }
        }

        debug!("reading {wire}");
        let response = self.request(Method::Get, &wire, params, None)?;

        let secret = if response.is_absent() {
            // Some servers attach a diagnostic body (warnings, partial
            // data) to 403/404; only an empty result means truly absent.
            match Secret::parse(&response.body)? {
                Some(secret) if !secret.is_empty() => Some(secret),
                _ => return Ok(None),
            }
        } else if !response.is_success() {
            return Err(Error::Transport(format!(
                "error reading {path:?}: status {}: {}",
                response.status,
                response.body.trim()
            )));
        } else {
            Secret::parse(&response.body)?
        };

        Ok(secret.map(|secret| mount.unwrap_secret(secret)))
    }

    /// Write `payload` to `path`, enveloping it as the engine requires.
    ///
    /// Failure is a direct propagation of the transport error; no retry.
    pub fn write(&self, path: &str, payload: &Map<String, Value>) -> Result<()> {
        let mount = Mount::detect(self, path)?;
        let wire = mount.data_path(path);
        let body = mount.wrap_payload(payload);

        debug!("writing secret to {wire}");
        let response = self.request(Method::Post, &wire, Vec::new(), Some(body))?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::Transport(format!(
                "error writing {path:?}: status {}: {}",
                response.status,
                response.body.trim()
            )))
        }
    }
}
