//! Client configuration.

use std::time::Duration;

use vaultmgr_common::{Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for a secret store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the store, e.g. `https://vault.internal:8200`.
    pub address: String,
    /// Authentication token sent with every request.
    pub token: String,
    /// Optional namespace header.
    pub namespace: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// PEM or DER CA bundle for TLS verification.
    pub ca_bundle: Option<Vec<u8>>,
    /// Skip TLS verification (development only).
    pub insecure_skip_tls: bool,
}

impl ClientConfig {
    /// Create a configuration with default timeout and TLS settings.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            namespace: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ca_bundle: None,
            insecure_skip_tls: false,
        }
    }

    /// Read configuration from the conventional environment variables.
    ///
    /// `VAULT_ADDR` and `VAULT_TOKEN` are required; `VAULT_NAMESPACE`,
    /// `VAULT_CACERT`, `VAULT_SKIP_VERIFY` and `VAULT_HTTP_TIMEOUT_SECS`
    /// are optional.
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| Error::Config("set VAULT_ADDR to the secret store URL".to_string()))?;
        let token = std::env::var("VAULT_TOKEN")
            .map_err(|_| Error::Config("set VAULT_TOKEN for authentication".to_string()))?;
        let namespace = std::env::var("VAULT_NAMESPACE").ok();
        let timeout = parse_timeout(std::env::var("VAULT_HTTP_TIMEOUT_SECS").ok());
        let ca_bundle = match std::env::var("VAULT_CACERT") {
            Ok(path) => Some(std::fs::read(&path).map_err(|e| {
                Error::Config(format!("failed to read VAULT_CACERT {path:?}: {e}"))
            })?),
            Err(_) => None,
        };
        let insecure_skip_tls = std::env::var("VAULT_SKIP_VERIFY")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(false);

        Ok(Self {
            address,
            token,
            namespace,
            timeout,
            ca_bundle,
            insecure_skip_tls,
        })
    }

    /// Build the blocking HTTP client described by this configuration.
    pub(crate) fn build_http_client(&self) -> Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder().timeout(self.timeout);
        if let Some(ca) = self.ca_bundle.as_deref() {
            let cert = reqwest::Certificate::from_pem(ca)
                .or_else(|_| reqwest::Certificate::from_der(ca))
                .map_err(|e| Error::Config(format!("failed to parse CA bundle: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if self.insecure_skip_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
    }
}

fn parse_timeout(raw: Option<String>) -> Duration {
    raw.and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}
