//! Common error types for Vaultmgr.

use thiserror::Error;

/// Top-level error type for Vaultmgr operations.
///
/// "Secret not found" is deliberately not a variant: reads return
/// `Ok(None)` so callers can treat absence as an expected outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or protocol failure talking to the secret store.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed base64, JSON, keyring, or encrypted message.
    #[error("Decode error: {0}")]
    Decode(String),

    /// OpenPGP operation failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// A list or delete failed partway through a cascading delete.
    #[error("Traversal error: {0}")]
    Traversal(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
