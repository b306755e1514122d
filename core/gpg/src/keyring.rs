//! Keyring parsing and key material handling.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pgp::composed::{from_bytes_many, PublicOrSecret, SignedSecretKey};
use zeroize::Zeroizing;

use vaultmgr_common::{Error, Result};

/// A parsed OpenPGP keyring, reduced to its secret keys.
///
/// Keyrings fetched from the store may interleave public and secret key
/// blocks; only the secret keys matter for decryption, so the rest is
/// discarded at parse time.
#[derive(Debug)]
pub struct Keyring {
    secret_keys: Vec<SignedSecretKey>,
}

impl Keyring {
    /// Parse a binary OpenPGP keyring.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut secret_keys = Vec::new();
        for entry in from_bytes_many(Cursor::new(bytes)) {
            let entry =
                entry.map_err(|e| Error::Crypto(format!("unreadable keyring entry: {e}")))?;
            if let PublicOrSecret::Secret(key) = entry {
                secret_keys.push(key);
            }
        }
        if secret_keys.is_empty() {
            return Err(Error::Crypto(
                "keyring contains no secret keys".to_string(),
            ));
        }
        Ok(Self { secret_keys })
    }

    /// Parse a keyring from its base64 transport encoding.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| Error::Decode(format!("keyring is not valid base64: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// The secret keys in ring order.
    pub fn secret_keys(&self) -> &[SignedSecretKey] {
        &self.secret_keys
    }
}

#[cfg(test)]
mod tests {
    use pgp::ser::Serialize;

    use super::*;
    use crate::keygen::generate_keypair;

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = Keyring::from_base64("not//valid==base64!!").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_garbage_bytes_are_crypto_error() {
        let garbage = BASE64.encode([0u8, 1, 2, 3, 4, 5, 6, 7]);
        let err = Keyring::from_base64(&garbage).unwrap_err();
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn test_public_only_ring_is_rejected() {
        let keypair = generate_keypair("ring test <ring@example.com>").unwrap();
        let encoded = BASE64.encode(keypair.public.to_bytes().unwrap());
        let err = Keyring::from_base64(&encoded).unwrap_err();
        assert!(err.to_string().contains("no secret keys"));
    }

    #[test]
    fn test_secret_ring_round_trip() {
        let keypair = generate_keypair("ring test <ring@example.com>").unwrap();
        let encoded = BASE64.encode(keypair.secret.to_bytes().unwrap());
        let keyring = Keyring::from_base64(&encoded).unwrap();
        assert_eq!(keyring.secret_keys().len(), 1);
    }
}
