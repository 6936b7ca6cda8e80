//! In-process age backend.
//!
//! Same ciphertext format as the `age` binary: x25519 recipients, scrypt
//! passphrases, binary or ASCII-armored output.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use age::armor::{ArmoredReader, ArmoredWriter, Format};
use age::secrecy::{ExposeSecret, SecretString};
use age::x25519;
use chrono::Utc;
use tracing::trace;
use zeroize::Zeroizing;

use super::{Cipher, GeneratedIdentity};
use crate::core::constants::SECRET_KEY_PREFIX;
use crate::core::types::PublicKey;
use crate::error::{Error, Result};

const TOOL: &str = "age";

/// age backend using the `age` crate
pub struct NativeAge;

impl Cipher for NativeAge {
    fn name(&self) -> &'static str {
        "native"
    }

    fn encrypt_with_recipients(
        &self,
        plaintext: &[u8],
        recipients: &[PublicKey],
        armor: bool,
    ) -> Result<Vec<u8>> {
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting"
        );

        if recipients.is_empty() {
            return Err(Error::MissingRecipients);
        }
        let parsed = recipients
            .iter()
            .map(|r| parse_recipient(r))
            .collect::<Result<Vec<_>>>()?;

        let encryptor =
            age::Encryptor::with_recipients(parsed.iter().map(|r| r as &dyn age::Recipient))
                .map_err(|e| Error::backend(TOOL, e.to_string()))?;

        seal(encryptor, plaintext, armor)
    }

    fn encrypt_with_passphrase(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        armor: bool,
    ) -> Result<Vec<u8>> {
        trace!(plaintext_len = plaintext.len(), "encrypting with passphrase");

        if passphrase.is_empty() {
            return Err(Error::backend(TOOL, "passphrase cannot be empty"));
        }
        let encryptor =
            age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_string()));

        seal(encryptor, plaintext, armor)
    }

    fn decrypt_with_identity(
        &self,
        ciphertext: &[u8],
        identity_path: &Path,
    ) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        let identities = load_identities(identity_path)?;
        open(
            ciphertext,
            identities.iter().map(|i| i as &dyn age::Identity),
            false,
        )
    }

    fn decrypt_with_passphrase(
        &self,
        ciphertext: &[u8],
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting with passphrase");

        let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
        open(
            ciphertext,
            std::iter::once(&identity as &dyn age::Identity),
            true,
        )
    }

    fn generate_identity(&self, output: Option<&Path>) -> Result<GeneratedIdentity> {
        let inner = x25519::Identity::generate();
        let generated = GeneratedIdentity {
            public: inner.to_public().to_string(),
            private: Zeroizing::new(inner.to_string().expose_secret().to_string()),
            created: Utc::now(),
        };

        if let Some(path) = output {
            write_key_file(path, generated.to_key_file().as_bytes())?;
        }

        Ok(generated)
    }
}

/// Parse a public key string into an age recipient
///
/// # Errors
///
/// Returns `Error::BackendError` if the key format is invalid.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    key.parse::<x25519::Recipient>()
        .map_err(|_| Error::backend(TOOL, format!("invalid recipient: {}", key)))
}

/// Read every `AGE-SECRET-KEY-` line of an identity file.
fn load_identities(path: &Path) -> Result<Vec<x25519::Identity>> {
    let contents = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
        Error::backend(TOOL, format!("failed to read identity file: {}", e))
    })?);

    let identities = contents
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(SECRET_KEY_PREFIX))
        .map(|line| {
            line.parse::<x25519::Identity>()
                .map_err(|e| Error::backend(TOOL, format!("failed to parse identity: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    if identities.is_empty() {
        return Err(Error::backend(TOOL, "no age identities found in identity file"));
    }
    Ok(identities)
}

fn seal(encryptor: age::Encryptor, plaintext: &[u8], armor: bool) -> Result<Vec<u8>> {
    let format = if armor {
        Format::AsciiArmor
    } else {
        Format::Binary
    };

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(ArmoredWriter::wrap_output(&mut encrypted, format)?)
        .map_err(|e| Error::backend(TOOL, e.to_string()))?;

    writer.write_all(plaintext)?;
    writer
        .finish()
        .and_then(|armored| armored.finish())
        .map_err(|e| Error::backend(TOOL, e.to_string()))?;

    trace!(ciphertext_len = encrypted.len(), "encrypted");
    Ok(encrypted)
}

fn open<'a>(
    ciphertext: &[u8],
    identities: impl Iterator<Item = &'a dyn age::Identity>,
    passphrase: bool,
) -> Result<Zeroizing<Vec<u8>>> {
    let decryptor = age::Decryptor::new(ArmoredReader::new(ciphertext))
        .map_err(|e| Error::DecryptionFailed(format!("invalid age ciphertext: {}", e)))?;

    match (decryptor.is_scrypt(), passphrase) {
        (true, false) => {
            return Err(Error::AuthFailure(
                "file is passphrase-encrypted, a passphrase is required instead of a key"
                    .to_string(),
            ))
        }
        (false, true) => {
            return Err(Error::AuthFailure(
                "file is encrypted to recipients, a private key is required instead of a passphrase"
                    .to_string(),
            ))
        }
        _ => {}
    }

    let mut reader = decryptor
        .decrypt(identities)
        .map_err(|e| classify(e, passphrase))?;

    let mut plaintext = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| Error::DecryptionFailed(format!("failed to read payload: {}", e)))?;

    trace!(plaintext_len = plaintext.len(), "decrypted");
    Ok(plaintext)
}

fn classify(err: age::DecryptError, passphrase: bool) -> Error {
    match err {
        age::DecryptError::NoMatchingKeys => {
            Error::AuthFailure("no identity matched any of the recipients".to_string())
        }
        age::DecryptError::DecryptionFailed if passphrase => {
            Error::AuthFailure("incorrect passphrase".to_string())
        }
        other => Error::DecryptionFailed(other.to_string()),
    }
}

/// Create a new owner-only file, refusing to overwrite.
pub(crate) fn write_key_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            Error::backend(
                "age-keygen",
                format!("refusing to overwrite existing file {}", path.display()),
            )
        } else {
            Error::Io(e)
        }
    })?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
