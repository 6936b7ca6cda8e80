//! Third-party envelope: a sops-encrypted YAML document.
//!
//! The document is opaque to lockbox apart from the `sops` metadata block,
//! whose key groups (age, PGP, cloud KMS, Vault) say who can unwrap the
//! data key. Reading and writing go through a [`SecretsManager`] one whole
//! document at a time, and a reseal hands every key group back to it.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::trace;
use zeroize::Zeroizing;

use super::scalar_text;
use crate::core::constants::SOPS_METADATA_KEY;
use crate::core::sops::{KeyGroups, SecretsManager};
use crate::core::types::{PublicKey, Secrets};
use crate::error::{Error, Result};

/// Parsed sops document.
#[derive(Debug, Clone)]
pub struct ThirdPartyEnvelope {
    raw: Vec<u8>,
    key_groups: KeyGroups,
    recipients: Vec<PublicKey>,
}

impl ThirdPartyEnvelope {
    /// Build from a document already known to carry a `sops` block.
    pub(crate) fn from_document(path: &Path, raw: Vec<u8>, document: &Mapping) -> Result<Self> {
        let Some(metadata) = document.get(SOPS_METADATA_KEY).and_then(Value::as_mapping) else {
            return Err(Error::malformed(path, "'sops' block is not a mapping"));
        };

        let key_groups = KeyGroups::from_metadata(metadata)
            .map_err(|e| Error::malformed(path, format!("'sops' key groups: {}", e)))?;
        let recipients = key_groups.recipients();

        Ok(Self {
            raw,
            key_groups,
            recipients,
        })
    }

    /// The encrypted document as stored.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// age recipients from `sops.age[].recipient`.
    pub fn recipients(&self) -> &[PublicKey] {
        &self.recipients
    }

    /// Every key group the data key is wrapped for.
    pub fn key_groups(&self) -> &KeyGroups {
        &self.key_groups
    }

    /// True when the data key is wrapped for age recipients, so reading
    /// needs an age identity. Otherwise sops resolves its own keys.
    pub fn is_asymmetric(&self) -> bool {
        !self.recipients.is_empty()
    }

    /// Decrypt the whole document in one backend call.
    ///
    /// # Errors
    ///
    /// `DecryptionFailed` if the plaintext is empty or not a mapping,
    /// `InvalidSecretValue` for an entry that is not a scalar.
    pub fn open(
        &self,
        manager: &dyn SecretsManager,
        identity_path: Option<&Path>,
    ) -> Result<Secrets> {
        trace!(len = self.raw.len(), "opening third-party envelope");

        let plaintext = manager.decrypt_document(&self.raw, identity_path)?;
        if plaintext.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::DecryptionFailed(format!(
                "{} returned empty output",
                manager.name()
            )));
        }

        let document: Value = serde_yaml::from_slice(&plaintext)
            .map_err(|e| Error::DecryptionFailed(format!("decrypted document: {}", e)))?;
        let Value::Mapping(document) = document else {
            return Err(Error::DecryptionFailed(
                "decrypted document is not a mapping".to_string(),
            ));
        };

        let mut secrets = Secrets::new();
        for (key, value) in &document {
            let Some(name) = scalar_text(key) else {
                return Err(Error::DecryptionFailed(
                    "decrypted document has a non-scalar key".to_string(),
                ));
            };
            if name == SOPS_METADATA_KEY {
                continue;
            }
            let Some(text) = scalar_text(value) else {
                return Err(Error::InvalidSecretValue {
                    name,
                    reason: "value is not a scalar".to_string(),
                });
            };
            secrets.insert(name, Zeroizing::new(text));
        }
        Ok(secrets)
    }

    /// Encrypt `secrets` as a new sops document in one backend call.
    ///
    /// # Errors
    ///
    /// `BackendError` if `keys` is empty or the manager's output is not a
    /// sops document.
    pub fn seal(manager: &dyn SecretsManager, keys: &KeyGroups, secrets: &Secrets) -> Result<Self> {
        trace!(count = secrets.len(), "sealing third-party envelope");

        if keys.is_empty() {
            return Err(Error::backend(
                manager.name(),
                "envelope has no key groups to encrypt to",
            ));
        }

        let mut document = Mapping::new();
        for (name, value) in secrets {
            document.insert(name.clone().into(), value.as_str().into());
        }
        let plaintext = Zeroizing::new(serde_yaml::to_string(&document)?);

        let raw = manager.encrypt_document(plaintext.as_bytes(), keys)?;

        let parsed: Value = serde_yaml::from_slice(&raw).map_err(|e| {
            Error::backend(manager.name(), format!("output is not YAML: {}", e))
        })?;
        match parsed {
            Value::Mapping(ref document) if document.contains_key(SOPS_METADATA_KEY) => {
                Self::from_document(Path::new(manager.name()), raw, document)
            }
            _ => Err(Error::backend(
                manager.name(),
                "output has no 'sops' metadata block",
            )),
        }
    }
}
