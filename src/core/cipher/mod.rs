//! Encryption backends.
//!
//! Encryption, key derivation and authenticated ciphertext formats are
//! delegated to age. Two backends implement the same contract:
//!
//! - **age-cli** (default): shells out to the `age` / `age-keygen` binaries.
//! - **native**: the `age` crate, in-process. Used for passphrase operations
//!   of the CLI backend (the `age` binary only reads passphrases from a TTY)
//!   and wherever the binaries are not installed.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file
//! 3. Wire it into `CipherBackend`

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::core::constants::{AGE_ARMOR_BEGIN, AGE_MAGIC, SECRET_KEY_PREFIX};
use crate::core::types::{EncryptedValue, PublicKey};
use crate::error::{Error, Result};

mod backend;
mod cli;
mod native;
pub(crate) mod process;

pub use backend::CipherBackend;
pub use cli::AgeCli;
pub use native::NativeAge;

/// Encryption backend contract.
///
/// Ciphertext is opaque to callers; only the backend interprets it.
pub trait Cipher {
    /// Backend name for display/config.
    fn name(&self) -> &'static str;

    /// Encrypt for a set of recipient public keys.
    ///
    /// # Errors
    ///
    /// Fails if any recipient is malformed or the list is empty.
    fn encrypt_with_recipients(
        &self,
        plaintext: &[u8],
        recipients: &[PublicKey],
        armor: bool,
    ) -> Result<Vec<u8>>;

    /// Encrypt with a passphrase.
    ///
    /// # Errors
    ///
    /// Fails on an empty passphrase.
    fn encrypt_with_passphrase(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        armor: bool,
    ) -> Result<Vec<u8>>;

    /// Decrypt with the private key(s) stored in `identity_path`.
    ///
    /// # Errors
    ///
    /// `AuthFailure` if no identity matches a recipient, `DecryptionFailed`
    /// if the ciphertext is malformed.
    fn decrypt_with_identity(
        &self,
        ciphertext: &[u8],
        identity_path: &Path,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Decrypt a passphrase-encrypted ciphertext.
    ///
    /// # Errors
    ///
    /// `AuthFailure` on a wrong passphrase.
    fn decrypt_with_passphrase(
        &self,
        ciphertext: &[u8],
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Generate a new x25519 identity, optionally writing it to `output`.
    ///
    /// # Errors
    ///
    /// Fails if `output` already exists.
    fn generate_identity(&self, output: Option<&Path>) -> Result<GeneratedIdentity>;
}

/// A freshly generated keypair.
pub struct GeneratedIdentity {
    pub public: PublicKey,
    pub private: Zeroizing<String>,
    pub created: DateTime<Utc>,
}

impl GeneratedIdentity {
    /// Parse the text format written by `age-keygen`:
    ///
    /// ```text
    /// # created: 2026-01-01T00:00:00Z
    /// # public key: age1...
    /// AGE-SECRET-KEY-1...
    /// ```
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let mut public = None;
        let mut private = None;
        let mut created = None;

        for line in text.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix("# public key:") {
                public = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("# created:") {
                created = DateTime::parse_from_rfc3339(value.trim())
                    .ok()
                    .map(|t| t.with_timezone(&Utc));
            } else if line.starts_with(SECRET_KEY_PREFIX) {
                private = Some(Zeroizing::new(line.to_string()));
            }
        }

        match (public, private) {
            (Some(public), Some(private)) => Ok(Self {
                public,
                private,
                created: created.unwrap_or_else(Utc::now),
            }),
            _ => Err(Error::backend(
                "age-keygen",
                "output did not contain a keypair",
            )),
        }
    }

    /// Render in the `age-keygen` text format.
    pub(crate) fn to_key_file(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "# created: {}\n# public key: {}\n{}\n",
            self.created.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.public,
            self.private.as_str()
        ))
    }
}

impl std::fmt::Debug for GeneratedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedIdentity")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .field("created", &self.created)
            .finish()
    }
}

/// Sniff whether a file is age ciphertext.
///
/// Looks for the binary header line or the armor boundary in the first
/// bytes; leading whitespace before an armor boundary is allowed.
pub fn looks_encrypted(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(128);
    File::open(path)?.take(128).read_to_end(&mut head)?;
    Ok(is_age_header(&head))
}

pub(crate) fn is_age_header(head: &[u8]) -> bool {
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    head.starts_with(AGE_MAGIC) || head[start..].starts_with(AGE_ARMOR_BEGIN)
}

/// Encrypt one secret value as armored text.
pub fn encrypt_value(
    cipher: &dyn Cipher,
    value: &str,
    recipients: &[PublicKey],
) -> Result<EncryptedValue> {
    let armored = cipher.encrypt_with_recipients(value.as_bytes(), recipients, true)?;
    String::from_utf8(armored)
        .map_err(|e| Error::backend(cipher.name(), format!("armored output is not UTF-8: {}", e)))
}

/// Decrypt one armored secret value.
///
/// # Errors
///
/// `DecryptionFailed` if the plaintext is empty or not UTF-8.
pub fn decrypt_value(
    cipher: &dyn Cipher,
    encrypted: &str,
    identity_path: &Path,
) -> Result<Zeroizing<String>> {
    let plaintext = cipher.decrypt_with_identity(encrypted.as_bytes(), identity_path)?;
    into_text(plaintext)
}

/// Convert decrypted bytes into a non-empty UTF-8 string.
pub(crate) fn into_text(plaintext: Zeroizing<Vec<u8>>) -> Result<Zeroizing<String>> {
    if plaintext.is_empty() {
        return Err(Error::DecryptionFailed("backend returned empty output".to_string()));
    }
    let text = std::str::from_utf8(&plaintext)
        .map_err(|e| Error::DecryptionFailed(format!("UTF-8 error: {}", e)))?;
    Ok(Zeroizing::new(text.to_string()))
}
