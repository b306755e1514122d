//! Wire transport for the secret store API.

use std::fmt;

use serde_json::Value;

use vaultmgr_common::{Error, Result};

use crate::config::ClientConfig;

/// HTTP method used against the store, including the non-standard LIST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
    List,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::List => "LIST",
        };
        write!(f, "{name}")
    }
}

/// A single request against the store's path-addressed API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Wire path below the API version prefix, e.g. `secret/data/foo`.
    pub path: String,
    /// Query parameters (the KV v2 version selector).
    pub params: Vec<(String, String)>,
    /// JSON request body for writes.
    pub body: Option<Value>,
    /// Response-wrapping TTL, if the client currently has one set.
    pub wrap_ttl: Option<String>,
}

/// Raw response: status code plus unparsed body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The overloaded statuses that can mean "truly absent" or "carries a
    /// diagnostic body"; callers disambiguate by parsing the body.
    pub fn is_absent(&self) -> bool {
        self.status == 403 || self.status == 404
    }
}

/// Transport seam between the client and a concrete store.
///
/// Implementations return `Ok` for every response the store produced, error
/// statuses included; `Err` is reserved for failing to obtain a response at
/// all. Implementations must handle their own authentication headers.
pub trait Transport: Send + Sync {
    /// Execute one request and hand back the raw response.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Blocking HTTP transport against a live store.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    address: String,
    token: String,
    namespace: Option<String>,
}

impl HttpTransport {
    /// Build a transport from client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_http_client()?,
            address: config.address.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!(
            "{}/v1/{}",
            self.address,
            request.path.trim_start_matches('/')
        );
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
            Method::List => reqwest::Method::from_bytes(b"LIST")
                .map_err(|e| Error::Transport(format!("LIST method rejected: {e}")))?,
        };

        let mut builder = self
            .http
            .request(method, url)
            .header("X-Vault-Token", &self.token);
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        if let Some(ttl) = &request.wrap_ttl {
            builder = builder.header("X-Vault-Wrap-TTL", ttl);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            Error::Transport(format!(
                "{} {:?} failed: {e}",
                request.method, request.path
            ))
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            Error::Transport(format!(
                "{} {:?} body read failed: {e}",
                request.method, request.path
            ))
        })?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_statuses() {
        for status in [403, 404] {
            let response = ApiResponse {
                status,
                body: String::new(),
            };
            assert!(response.is_absent());
            assert!(!response.is_success());
        }
        let ok = ApiResponse {
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!ok.is_absent());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::List.to_string(), "LIST");
        assert_eq!(Method::Get.to_string(), "GET");
    }

    #[test]
    fn test_truncated_body_is_transport_error() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            // Promise more body bytes than are sent, then close the socket.
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial");
        });

        let config = ClientConfig::new(format!("http://{addr}"), "token");
        let transport = HttpTransport::new(&config).unwrap();
        let request = ApiRequest {
            method: Method::Get,
            path: "secret/data/app".to_string(),
            params: Vec::new(),
            body: None,
            wrap_ttl: None,
        };

        let err = transport.send(&request).unwrap_err();
        server.join().unwrap();

        // A body that cannot be read must never look like "not found".
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("secret/data/app"));
    }
}
