//! age CLI backend.
//!
//! Encrypts and decrypts by shelling out to the `age` and `age-keygen`
//! binaries.
//!
//! ## Requirements
//!
//! - `age` and `age-keygen` must be installed (https://age-encryption.org)
//!
//! The `age` binary reads passphrases only from a terminal, so the two
//! passphrase operations run in-process through [`NativeAge`], which writes
//! and reads the same format.

use std::path::Path;
use std::process::Command;

use tracing::trace;
use zeroize::Zeroizing;

use super::process::{locate, run, stderr_text};
use super::{Cipher, GeneratedIdentity, NativeAge};
use crate::core::types::PublicKey;
use crate::error::{Error, Result};

/// age backend using the age CLI
#[derive(Debug, Clone)]
pub struct AgeCli {
    age: String,
    age_keygen: String,
}

impl Default for AgeCli {
    fn default() -> Self {
        Self::new("age", "age-keygen")
    }
}

impl AgeCli {
    /// Backend calling the given binaries (names on PATH or paths).
    pub fn new(age: impl Into<String>, age_keygen: impl Into<String>) -> Self {
        Self {
            age: age.into(),
            age_keygen: age_keygen.into(),
        }
    }

    /// Check that both binaries are installed.
    ///
    /// # Errors
    ///
    /// Returns `Error::BackendUnavailable` naming the missing tool.
    pub fn check(&self) -> Result<()> {
        locate(&self.age)?;
        locate(&self.age_keygen)?;
        Ok(())
    }

    fn age_command(&self) -> Result<Command> {
        Ok(Command::new(locate(&self.age)?))
    }
}

impl Cipher for AgeCli {
    fn name(&self) -> &'static str {
        "age-cli"
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
            "encrypting with age CLI"
        );

        if recipients.is_empty() {
            return Err(Error::MissingRecipients);
        }

        let mut cmd = self.age_command()?;
        cmd.arg("--encrypt");
        if armor {
            cmd.arg("--armor");
        }
        for recipient in recipients {
            cmd.arg("--recipient").arg(recipient);
        }

        let output = run(&self.age, cmd, Some(plaintext))?;
        if !output.status.success() {
            return Err(Error::backend(&self.age, stderr_text(&output)));
        }
        Ok(output.stdout)
    }

    fn encrypt_with_passphrase(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        armor: bool,
    ) -> Result<Vec<u8>> {
        NativeAge.encrypt_with_passphrase(plaintext, passphrase, armor)
    }

    fn decrypt_with_identity(
        &self,
        ciphertext: &[u8],
        identity_path: &Path,
    ) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting with age CLI");

        let mut cmd = self.age_command()?;
        cmd.arg("--decrypt").arg("--identity").arg(identity_path);

        let output = run(&self.age, cmd, Some(ciphertext))?;
        if !output.status.success() {
            return Err(classify_decrypt_failure(&stderr_text(&output)));
        }
        Ok(Zeroizing::new(output.stdout))
    }

    fn decrypt_with_passphrase(
        &self,
        ciphertext: &[u8],
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        NativeAge.decrypt_with_passphrase(ciphertext, passphrase)
    }

    fn generate_identity(&self, output: Option<&Path>) -> Result<GeneratedIdentity> {
        let mut cmd = Command::new(locate(&self.age_keygen)?);

        if let Some(path) = output {
            if path.exists() {
                return Err(Error::backend(
                    &self.age_keygen,
                    format!("refusing to overwrite existing file {}", path.display()),
                ));
            }
            cmd.arg("-o").arg(path);
        }

        let result = run(&self.age_keygen, cmd, None)?;
        if !result.status.success() {
            return Err(Error::backend(&self.age_keygen, stderr_text(&result)));
        }

        match output {
            Some(path) => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
                }
                let text = Zeroizing::new(std::fs::read_to_string(path)?);
                GeneratedIdentity::parse(&text)
            }
            None => {
                let text = Zeroizing::new(String::from_utf8_lossy(&result.stdout).into_owned());
                GeneratedIdentity::parse(&text)
            }
        }
    }
}

/// Map age's stderr to the error taxonomy.
fn classify_decrypt_failure(stderr: &str) -> Error {
    let lower = stderr.to_lowercase();
    if lower.contains("passphrase-encrypted") {
        Error::AuthFailure(
            "file is passphrase-encrypted, a passphrase is required instead of a key".to_string(),
        )
    } else if lower.contains("no identity matched") || lower.contains("incorrect passphrase") {
        Error::AuthFailure(stderr.to_string())
    } else {
        Error::DecryptionFailed(stderr.to_string())
    }
}
