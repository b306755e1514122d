//! Importing cloud credentials whose secret half arrives encrypted.

use serde_json::{Map, Value};
use tracing::debug;

use vaultmgr_client::VaultClient;
use vaultmgr_common::{Error, Result};

use crate::decrypt::decrypt_from_store;

/// Field names the imported credential pair is stored under.
pub const ACCESS_KEY_FIELD: &str = "AWS_ACCESS_KEY";
pub const SECRET_KEY_FIELD: &str = "AWS_SECRET_KEY";

/// An access-key pair to import, with the secret half still encrypted.
#[derive(Debug, Clone)]
pub struct CredentialImport {
    /// Plaintext access key id.
    pub access_key: String,
    /// Base64-encoded OpenPGP message holding the secret key.
    pub encrypted_secret: String,
    /// Store path of the keyring that can decrypt it.
    pub keyring_path: String,
    /// Store path the decrypted pair is written to.
    pub destination: String,
}

/// Decrypt the secret half and write the full pair to the store.
///
/// Fails without writing anything when the keyring is absent.
pub fn import_credentials(client: &VaultClient, import: &CredentialImport) -> Result<()> {
    let secret_key = decrypt_from_store(client, &import.keyring_path, &import.encrypted_secret)?
        .ok_or_else(|| {
            Error::InvalidInput(format!("no keyring at {:?}", import.keyring_path))
        })?;

    let mut payload = Map::new();
    payload.insert(
        ACCESS_KEY_FIELD.to_string(),
        Value::String(import.access_key.clone()),
    );
    payload.insert(SECRET_KEY_FIELD.to_string(), Value::String(secret_key));

    debug!("importing credentials to {}", import.destination);
    client.write(&import.destination, &payload)
}
