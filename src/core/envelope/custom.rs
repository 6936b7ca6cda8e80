//! Custom envelope: per-value age encryption.
//!
//! ```yaml
//! lockbox_version: 0.1.0
//! lockbox_created: 2026-01-01T00:00:00Z
//! lockbox_recipients:
//!   - age1...
//! API_KEY: |
//!   -----BEGIN AGE ENCRYPTED FILE-----
//!   ...
//!   -----END AGE ENCRYPTED FILE-----
//! ```
//!
//! Names stay readable; every value is an independent armored age blob, so
//! reading one secret costs one decryption.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde_yaml::{Mapping, Value};
use tracing::trace;

use super::{scalar_text, string_list};
use crate::core::cipher::{decrypt_value, encrypt_value, Cipher};
use crate::core::constants::{KEY_CREATED, KEY_RECIPIENTS, KEY_VERSION, RESERVED_KEYS};
use crate::core::types::{EncryptedValue, PublicKey, SecretName, Secrets};
use crate::error::{Error, Result};

/// Parsed custom envelope. Values are still ciphertext.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEnvelope {
    pub version: String,
    pub created: String,
    pub recipients: Vec<PublicKey>,
    pub entries: BTreeMap<SecretName, EncryptedValue>,
}

impl CustomEnvelope {
    /// Build from a YAML mapping already known to carry `lockbox_version`.
    pub(crate) fn from_mapping(path: &Path, mapping: &Mapping) -> Result<Self> {
        let version = mapping
            .get(KEY_VERSION)
            .and_then(scalar_text)
            .ok_or_else(|| Error::malformed(path, format!("'{}' is not a scalar", KEY_VERSION)))?;
        let created = mapping
            .get(KEY_CREATED)
            .and_then(scalar_text)
            .unwrap_or_default();
        let recipients = string_list(mapping, KEY_RECIPIENTS).ok_or_else(|| {
            Error::malformed(path, format!("'{}' must be a list of keys", KEY_RECIPIENTS))
        })?;
        if recipients.is_empty() {
            return Err(Error::malformed(path, "envelope has no recipients"));
        }

        let mut entries = BTreeMap::new();
        for (key, value) in mapping {
            let Some(name) = key.as_str() else {
                return Err(Error::malformed(path, "secret names must be strings"));
            };
            if RESERVED_KEYS.contains(&name) {
                continue;
            }
            let Some(ciphertext) = value.as_str() else {
                return Err(Error::malformed(
                    path,
                    format!("value of '{}' is not an encrypted string", name),
                ));
            };
            entries.insert(name.to_string(), ciphertext.to_string());
        }

        Ok(Self {
            version,
            created,
            recipients,
            entries,
        })
    }

    /// Encrypt every secret for `recipients`, one backend call per value.
    ///
    /// `created` is carried over from an existing envelope; a new envelope
    /// is stamped with the current time.
    pub fn seal(
        cipher: &dyn Cipher,
        recipients: &[PublicKey],
        created: Option<String>,
        secrets: &Secrets,
    ) -> Result<Self> {
        trace!(count = secrets.len(), "sealing custom envelope");

        let entries = secrets
            .iter()
            .map(|(name, value)| Ok((name.clone(), encrypt_value(cipher, value, recipients)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: created
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            recipients: recipients.to_vec(),
            entries,
        })
    }

    /// Decrypt the named entries, or all of them.
    ///
    /// Names without an entry are skipped; the caller reports them.
    pub fn open(
        &self,
        cipher: &dyn Cipher,
        identity_path: &Path,
        names: Option<&[String]>,
    ) -> Result<Secrets> {
        let selected: Vec<&String> = match names {
            Some(names) => names
                .iter()
                .filter(|name| self.entries.contains_key(name.as_str()))
                .collect(),
            None => self.entries.keys().collect(),
        };
        trace!(count = selected.len(), "opening custom envelope");

        let mut secrets = Secrets::new();
        for name in selected {
            let ciphertext = &self.entries[name.as_str()];
            secrets.insert(name.clone(), decrypt_value(cipher, ciphertext, identity_path)?);
        }
        Ok(secrets)
    }

    /// Serialize with metadata keys first, then entries in name order.
    pub fn to_yaml(&self) -> Result<String> {
        let mut mapping = Mapping::new();
        mapping.insert(KEY_VERSION.into(), self.version.clone().into());
        mapping.insert(KEY_CREATED.into(), self.created.clone().into());
        mapping.insert(
            KEY_RECIPIENTS.into(),
            Value::Sequence(self.recipients.iter().map(|r| r.clone().into()).collect()),
        );
        for (name, ciphertext) in &self.entries {
            mapping.insert(name.clone().into(), ciphertext.clone().into());
        }
        Ok(serde_yaml::to_string(&mapping)?)
    }
}
