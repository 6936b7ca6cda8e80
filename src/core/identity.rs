//! Identity references and resolution.
//!
//! An identity is an age private key, given either as a key file path or
//! inline as an `AGE-SECRET-KEY-...` string. A key file may itself be
//! age-encrypted with a passphrase.
//!
//! Backends only accept identity *files*, so [`ScopedIdentity::resolve`]
//! turns any reference into a usable path. Inline keys and decrypted key
//! files land in a [`ScratchFile`] that lives exactly as long as the guard.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::cipher::{is_age_header, looks_encrypted, Cipher};
use crate::core::scratch::ScratchFile;
use crate::error::{Error, Result};

/// Where the private key comes from.
#[derive(Clone)]
pub enum IdentitySource {
    /// Path to a key file (plain or passphrase-encrypted)
    File(PathBuf),
    /// Key material held in memory
    Inline(Zeroizing<String>),
}

/// A private key plus the passphrase that protects it, if any.
#[derive(Clone)]
pub struct IdentityRef {
    source: IdentitySource,
    passphrase: Option<Zeroizing<String>>,
}

impl IdentityRef {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: IdentitySource::File(path.into()),
            passphrase: None,
        }
    }

    pub fn inline(key: impl Into<String>) -> Self {
        Self {
            source: IdentitySource::Inline(Zeroizing::new(key.into())),
            passphrase: None,
        }
    }

    /// Attach the passphrase that unlocks an encrypted key.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    pub fn source(&self) -> &IdentitySource {
        &self.source
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_ref().map(|p| p.as_str())
    }
}

impl fmt::Debug for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            IdentitySource::File(path) => format!("File({})", path.display()),
            IdentitySource::Inline(_) => "Inline(<redacted>)".to_string(),
        };
        f.debug_struct("IdentityRef")
            .field("source", &source)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// An identity file path valid for the lifetime of the guard.
///
/// Transient key material is wiped and removed on drop.
pub struct ScopedIdentity {
    path: PathBuf,
    scratch: Option<ScratchFile>,
}

impl ScopedIdentity {
    /// Resolve `identity` to a plaintext key file.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if a key file does not exist
    /// - `MissingPassphrase` if the key is encrypted and no passphrase was given
    /// - `AuthFailure` if the passphrase is wrong
    pub fn resolve(cipher: &dyn Cipher, identity: &IdentityRef) -> Result<Self> {
        match &identity.source {
            IdentitySource::Inline(key) => {
                if is_age_header(key.as_bytes()) {
                    debug!("inline identity is encrypted");
                    return Self::unlock(cipher, key.as_bytes(), identity.passphrase());
                }
                debug!("using inline identity");
                Self::transient(key.as_bytes())
            }
            IdentitySource::File(path) => {
                if !path.is_file() {
                    return Err(Error::FileNotFound(path.clone()));
                }
                warn_if_exposed(path);

                if looks_encrypted(path)? {
                    debug!(path = %path.display(), "identity file is encrypted");
                    let ciphertext = std::fs::read(path)?;
                    return Self::unlock(cipher, &ciphertext, identity.passphrase());
                }
                if identity.passphrase.is_some() {
                    debug!("identity file is not encrypted, ignoring passphrase");
                }
                Ok(Self {
                    path: path.clone(),
                    scratch: None,
                })
            }
        }
    }

    fn unlock(cipher: &dyn Cipher, ciphertext: &[u8], passphrase: Option<&str>) -> Result<Self> {
        let passphrase = passphrase.ok_or(Error::MissingPassphrase)?;
        let key = cipher.decrypt_with_passphrase(ciphertext, passphrase)?;
        if key.is_empty() {
            return Err(Error::DecryptionFailed(
                "encrypted identity is empty".to_string(),
            ));
        }
        Self::transient(&key)
    }

    fn transient(key: &[u8]) -> Result<Self> {
        let scratch = ScratchFile::create(key, ".key")?;
        Ok(Self {
            path: scratch.path().to_path_buf(),
            scratch: Some(scratch),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the key lives in a transient file owned by this guard.
    pub fn is_transient(&self) -> bool {
        self.scratch.is_some()
    }
}

impl fmt::Debug for ScopedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedIdentity")
            .field("transient", &self.is_transient())
            .finish()
    }
}

#[cfg(unix)]
fn warn_if_exposed(path: &Path) {
    use crate::core::validation::check_file_permissions;

    if let Ok(Some(mode)) = check_file_permissions(path, 0o600) {
        warn!(
            "Insecure key file permissions: {:o}. Run: chmod 600 {}",
            mode,
            path.display()
        );
    }
}

#[cfg(not(unix))]
fn warn_if_exposed(_path: &Path) {}
