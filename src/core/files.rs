//! Whole-file encryption.
//!
//! Encrypt any file to recipients or a passphrase, and decrypt it back
//! either into memory or to an owner-only output file.

use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::atomic;
use crate::core::cipher::Cipher;
use crate::core::identity::{IdentityRef, ScopedIdentity};
use crate::core::types::PublicKey;
use crate::core::validation::normalize_recipients;
use crate::error::{Error, Result};

/// How a file is encrypted.
#[derive(Clone)]
pub enum Protection {
    Recipients(Vec<PublicKey>),
    Passphrase(Zeroizing<String>),
}

/// How a file is decrypted. The two are mutually exclusive.
#[derive(Clone)]
pub enum Unlock {
    Identity(IdentityRef),
    Passphrase(Zeroizing<String>),
}

impl std::fmt::Debug for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recipients(recipients) => f.debug_tuple("Recipients").field(recipients).finish(),
            Self::Passphrase(_) => f.write_str("Passphrase(<redacted>)"),
        }
    }
}

impl std::fmt::Debug for Unlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity(identity) => f.debug_tuple("Identity").field(identity).finish(),
            Self::Passphrase(_) => f.write_str("Passphrase(<redacted>)"),
        }
    }
}

/// Encrypt `input` into `output`.
///
/// The output is replaced atomically and keeps the permissions of any file
/// it replaces.
///
/// # Errors
///
/// - `FileNotFound` if `input` does not exist
/// - `MissingRecipients` for an empty recipient list
/// - `Io` if `input` and `output` are the same file
pub fn encrypt_file(
    cipher: &dyn Cipher,
    input: &Path,
    output: &Path,
    protection: &Protection,
    armor: bool,
) -> Result<()> {
    let plaintext = read_input(input)?;
    ensure_distinct(input, output)?;

    let ciphertext = match protection {
        Protection::Recipients(recipients) => {
            let recipients = normalize_recipients(recipients);
            if recipients.is_empty() {
                return Err(Error::MissingRecipients);
            }
            debug!(
                input = %input.display(),
                recipients = recipients.len(),
                armor,
                "encrypting file to recipients"
            );
            cipher.encrypt_with_recipients(&plaintext, &recipients, armor)?
        }
        Protection::Passphrase(passphrase) => {
            debug!(input = %input.display(), armor, "encrypting file with passphrase");
            cipher.encrypt_with_passphrase(&plaintext, passphrase, armor)?
        }
    };

    atomic::write(output, &ciphertext)
}

/// Decrypt `input` into memory.
///
/// Armored and binary ciphertext are both accepted.
///
/// # Errors
///
/// - `FileNotFound` if `input` does not exist
/// - `AuthFailure` if the key does not fit, including a passphrase file
///   opened with an identity or the reverse
/// - `DecryptionFailed` for malformed ciphertext
pub fn decrypt_file(cipher: &dyn Cipher, input: &Path, unlock: &Unlock) -> Result<Zeroizing<Vec<u8>>> {
    let ciphertext = read_input(input)?;

    match unlock {
        Unlock::Identity(identity) => {
            debug!(input = %input.display(), "decrypting file with identity");
            let scoped = ScopedIdentity::resolve(cipher, identity)?;
            cipher.decrypt_with_identity(&ciphertext, scoped.path())
        }
        Unlock::Passphrase(passphrase) => {
            debug!(input = %input.display(), "decrypting file with passphrase");
            cipher.decrypt_with_passphrase(&ciphertext, passphrase)
        }
    }
}

/// Decrypt `input` into an owner-only `output` file.
///
/// # Errors
///
/// Any error of [`decrypt_file`]; `Io` if `input` and `output` are the same
/// file.
pub fn decrypt_file_to(cipher: &dyn Cipher, input: &Path, output: &Path, unlock: &Unlock) -> Result<()> {
    ensure_distinct(input, output)?;
    let plaintext = decrypt_file(cipher, input, unlock)?;
    atomic::write_private(output, &plaintext)
}

fn read_input(input: &Path) -> Result<Zeroizing<Vec<u8>>> {
    match std::fs::read(input) {
        Ok(bytes) => Ok(Zeroizing::new(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound(input.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("input and output are the same file: {}", input.display()),
        )));
    }
    Ok(())
}
