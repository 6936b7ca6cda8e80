//! Cipher backend selection and dispatch.
//!
//! Two modes:
//! - **AgeCli** (default): the `age` / `age-keygen` binaries
//! - **Native**: the `age` crate, in-process

use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use super::{AgeCli, Cipher, GeneratedIdentity, NativeAge};
use crate::core::config::{BackendKind, Config};
use crate::core::types::PublicKey;
use crate::error::Result;

/// Cipher backend chosen by configuration.
#[derive(Debug, Clone)]
pub enum CipherBackend {
    /// age binaries
    AgeCli(AgeCli),
    /// age crate
    Native,
}

impl CipherBackend {
    /// Create a cipher backend from configuration.
    pub fn from_config(config: &Config) -> Self {
        match config.backend.kind {
            BackendKind::AgeCli => {
                debug!(age = %config.backend.age, "creating age-cli cipher backend");
                Self::AgeCli(AgeCli::new(
                    config.backend.age.clone(),
                    config.backend.age_keygen.clone(),
                ))
            }
            BackendKind::Native => {
                debug!("creating native cipher backend");
                Self::Native
            }
        }
    }

    fn inner(&self) -> &dyn Cipher {
        match self {
            Self::AgeCli(cli) => cli,
            Self::Native => &NativeAge,
        }
    }
}

impl Cipher for CipherBackend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn encrypt_with_recipients(
        &self,
        plaintext: &[u8],
        recipients: &[PublicKey],
        armor: bool,
    ) -> Result<Vec<u8>> {
        self.inner()
            .encrypt_with_recipients(plaintext, recipients, armor)
    }

    fn encrypt_with_passphrase(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        armor: bool,
    ) -> Result<Vec<u8>> {
        self.inner()
            .encrypt_with_passphrase(plaintext, passphrase, armor)
    }

    fn decrypt_with_identity(
        &self,
        ciphertext: &[u8],
        identity_path: &Path,
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.inner().decrypt_with_identity(ciphertext, identity_path)
    }

    fn decrypt_with_passphrase(
        &self,
        ciphertext: &[u8],
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.inner().decrypt_with_passphrase(ciphertext, passphrase)
    }

    fn generate_identity(&self, output: Option<&Path>) -> Result<GeneratedIdentity> {
        self.inner().generate_identity(output)
    }
}
