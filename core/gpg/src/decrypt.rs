//! Message decryption with store-held keyrings.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pgp::composed::{Deserializable, Message, SignedSecretKey};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use vaultmgr_client::VaultClient;
use vaultmgr_common::{Error, Result};

use crate::keyring::Keyring;

/// Field under which keyring material is stored.
pub const KEY_FIELD: &str = "KEY";

/// Decrypt a binary OpenPGP message with the ring's secret keys.
pub fn decrypt_message(keyring: &Keyring, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let message = Message::from_bytes(Cursor::new(ciphertext))
        .map_err(|e| Error::Crypto(format!("unreadable message: {e}")))?;
    let keys: Vec<&SignedSecretKey> = keyring.secret_keys().iter().collect();
    let (decrypted, _key_ids) = message
        .decrypt(String::new, &keys)
        .map_err(|e| Error::Crypto(format!("decryption failed: {e}")))?;
    match decrypted
        .get_content()
        .map_err(|e| Error::Crypto(format!("reading decrypted content: {e}")))?
    {
        Some(content) => Ok(content),
        None => Err(Error::Crypto(
            "decrypted message carries no literal content".to_string(),
        )),
    }
}

/// Decrypt a base64-encoded message with the keyring stored at `key_path`.
///
/// The keyring is fetched fresh from the store on every call; nothing is
/// cached. Returns `Ok(None)` when no secret exists at `key_path`. A secret
/// that exists but lacks the `KEY` field is malformed and fails instead.
pub fn decrypt_from_store(
    client: &VaultClient,
    key_path: &str,
    ciphertext: &str,
) -> Result<Option<String>> {
    let Some(secret) = client.read(key_path, None)? else {
        warn!("no keyring stored at {key_path}");
        return Ok(None);
    };
    let encoded = secret.field_str(KEY_FIELD).ok_or_else(|| {
        Error::Decode(format!("secret at {key_path:?} has no {KEY_FIELD} field"))
    })?;
    let keyring = Keyring::from_base64(encoded)?;

    let ciphertext = Zeroizing::new(
        BASE64
            .decode(ciphertext.trim())
            .map_err(|e| Error::Decode(format!("ciphertext is not valid base64: {e}")))?,
    );
    debug!("decrypting {} bytes with ring at {key_path}", ciphertext.len());
    let plaintext = Zeroizing::new(decrypt_message(&keyring, &ciphertext)?);
    match std::str::from_utf8(&plaintext) {
        Ok(text) => Ok(Some(text.to_string())),
        Err(e) => Err(Error::Decode(format!(
            "decrypted payload is not utf-8: {e}"
        ))),
    }
}
