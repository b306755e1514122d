//! Keypair generation and storage.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pgp::composed::{
    KeyType, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey, SubkeyParamsBuilder,
};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::ser::Serialize;
use pgp::types::SecretKeyTrait;
use serde_json::{Map, Value};
use tracing::debug;
use zeroize::Zeroizing;

use vaultmgr_client::VaultClient;
use vaultmgr_common::{path, Error, Result};

use crate::decrypt::KEY_FIELD;

/// A freshly generated signing key with an encryption subkey.
pub struct GeneratedKeypair {
    pub secret: SignedSecretKey,
    pub public: SignedPublicKey,
}

/// Store paths a keypair was written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypairPaths {
    pub public: String,
    pub private: String,
}

/// Generate an EdDSA signing key carrying an ECDH encryption subkey.
///
/// The key is unprotected; protection is the store's job, not a passphrase's.
pub fn generate_keypair(user_id: &str) -> Result<GeneratedKeypair> {
    let subkey = SubkeyParamsBuilder::default()
        .key_type(KeyType::ECDH(ECCCurve::Curve25519))
        .can_encrypt(true)
        .build()
        .map_err(|e| Error::Crypto(format!("invalid subkey parameters: {e}")))?;
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::EdDSA)
        .can_certify(true)
        .can_sign(true)
        .primary_user_id(user_id.to_string())
        .subkey(subkey)
        .build()
        .map_err(|e| Error::Crypto(format!("invalid key parameters: {e}")))?;

    let secret = params
        .generate()
        .map_err(|e| Error::Crypto(format!("key generation failed: {e}")))?;
    let secret = secret
        .sign(String::new)
        .map_err(|e| Error::Crypto(format!("self-signing secret key failed: {e}")))?;
    let public = secret
        .public_key()
        .sign(&secret, String::new)
        .map_err(|e| Error::Crypto(format!("signing public key failed: {e}")))?;

    debug!("generated keypair for {user_id}");
    Ok(GeneratedKeypair { secret, public })
}

/// Write both halves of a keypair beneath `base_path`.
///
/// The public ring lands at `<base_path>/public` and the secret ring at
/// `<base_path>/private`, each base64-encoded under the `KEY` field.
pub fn store_keypair(
    client: &VaultClient,
    base_path: &str,
    keypair: &GeneratedKeypair,
) -> Result<KeypairPaths> {
    let secret_bytes = Zeroizing::new(
        keypair
            .secret
            .to_bytes()
            .map_err(|e| Error::Crypto(format!("serializing secret key: {e}")))?,
    );
    let public_bytes = keypair
        .public
        .to_bytes()
        .map_err(|e| Error::Crypto(format!("serializing public key: {e}")))?;

    let paths = KeypairPaths {
        public: path::join(base_path, "public"),
        private: path::join(base_path, "private"),
    };
    client.write(&paths.public, &key_payload(&public_bytes))?;
    client.write(&paths.private, &key_payload(&secret_bytes))?;
    Ok(paths)
}

fn key_payload(ring: &[u8]) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(KEY_FIELD.to_string(), Value::String(BASE64.encode(ring)));
    payload
}
