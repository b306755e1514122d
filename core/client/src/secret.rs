//! Parsed secret responses.

use serde::Deserialize;
use serde_json::{Map, Value};

use vaultmgr_common::{Error, Result};

/// A secret read from the store.
///
/// `Option<Secret>` is the caller-facing shape: `None` means "nothing at
/// this path" and is a meaningful value, distinct from an empty-but-present
/// secret.
#[derive(Debug, Clone, Default)]
pub struct Secret {
    /// Key/value payload. Under KV v2 this is the inner data map once the
    /// version envelope has been unwrapped.
    pub data: Map<String, Value>,
    /// Warnings the store attached to the response.
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
struct RawSecret {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

impl Secret {
    /// Parse a response body. An empty body parses to `None`.
    pub fn parse(body: &str) -> Result<Option<Self>> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let raw: RawSecret = serde_json::from_str(body)
            .map_err(|e| Error::Decode(format!("failed to parse secret body: {e}")))?;
        Ok(Some(Self {
            data: raw.data.unwrap_or_default(),
            warnings: raw.warnings.unwrap_or_default(),
        }))
    }

    /// True when the secret carries neither data nor warnings.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.warnings.is_empty()
    }

    /// Fetch a string field from the data map.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body_is_none() {
        assert!(Secret::parse("").unwrap().is_none());
        assert!(Secret::parse("  \n").unwrap().is_none());
    }

    #[test]
    fn test_parse_data_and_warnings() {
        let body = r#"{"data":{"password":"hunter2"},"warnings":["deprecated path"]}"#;
        let secret = Secret::parse(body).unwrap().unwrap();
        assert_eq!(secret.field_str("password"), Some("hunter2"));
        assert_eq!(secret.warnings, vec!["deprecated path".to_string()]);
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_parse_errors_only_body_is_empty_secret() {
        let secret = Secret::parse(r#"{"errors":[]}"#).unwrap().unwrap();
        assert!(secret.is_empty());
    }

    #[test]
    fn test_parse_malformed_body_is_decode_error() {
        let err = Secret::parse("{not json").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
