//! OpenPGP operations backed by keyrings stored in the secret store.
//!
//! Keyrings live as secrets whose `KEY` field holds a base64-encoded binary
//! OpenPGP keyring. This crate fetches them through a
//! [`vaultmgr_client::VaultClient`], decodes them, and runs decryption with
//! the contained secret keys. Key generation and credential import build on
//! the same layout.

pub mod credentials;
pub mod decrypt;
pub mod keygen;
pub mod keyring;

pub use credentials::{import_credentials, CredentialImport};
pub use decrypt::{decrypt_from_store, decrypt_message, KEY_FIELD};
pub use keygen::{generate_keypair, store_keypair, GeneratedKeypair, KeypairPaths};
pub use keyring::Keyring;
