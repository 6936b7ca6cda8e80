//! Secret store operations.
//!
//! A store is a single envelope file. [`SecretStore`] detects its format,
//! decrypts and merges on update, re-encrypts through the configured
//! backend and replaces the file atomically.
//!
//! ## Example
//!
//! ```ignore
//! let store = SecretStore::from_config(&Config::load()?);
//! store.put(path, &secrets, &PutOptions::new_file(vec![public_key]))?;
//! let retrieved = store.get(path, Some(&IdentityRef::file(key)), None)?;
//! ```

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::atomic;
use crate::core::cipher::{Cipher, CipherBackend};
use crate::core::config::Config;
use crate::core::envelope::{
    detect, CustomEnvelope, Detected, Envelope, Format, ThirdPartyEnvelope,
};
use crate::core::identity::{IdentityRef, ScopedIdentity};
use crate::core::sops::{KeyGroups, SecretsManager, SopsCli};
use crate::core::types::{PublicKey, Secrets};
use crate::core::validation::{normalize_recipients, same_recipients, validate_name, validate_value};
use crate::error::{Error, Result};

mod export;

pub use export::Exported;

/// Options for [`SecretStore::put`].
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Required for a new file; must match the envelope for an existing one
    pub recipients: Option<Vec<PublicKey>>,
    /// Required for an existing file
    pub identity: Option<IdentityRef>,
    /// Format of a newly created envelope; ignored for existing files
    pub format: Format,
}

impl PutOptions {
    /// Options for creating a store encrypted to `recipients`.
    pub fn new_file(recipients: Vec<PublicKey>) -> Self {
        Self {
            recipients: Some(recipients),
            ..Self::default()
        }
    }

    /// Options for updating a store readable with `identity`.
    pub fn update(identity: IdentityRef) -> Self {
        Self {
            identity: Some(identity),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

/// Non-fatal findings of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A requested name is not in the store
    MissingName(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName(name) => write!(f, "secret '{}' not found", name),
        }
    }
}

/// Decrypted secrets plus any warnings collected on the way.
#[derive(Debug, Default)]
pub struct Retrieved {
    pub secrets: Secrets,
    pub warnings: Vec<Warning>,
}

/// Format-detecting, merge-on-write secret store.
pub struct SecretStore {
    cipher: Box<dyn Cipher>,
    manager: Box<dyn SecretsManager>,
}

impl SecretStore {
    pub fn new(cipher: impl Cipher + 'static, manager: impl SecretsManager + 'static) -> Self {
        Self {
            cipher: Box::new(cipher),
            manager: Box::new(manager),
        }
    }

    /// Store using the backends named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CipherBackend::from_config(config),
            SopsCli::new(config.sops.binary.clone()),
        )
    }

    pub fn cipher(&self) -> &dyn Cipher {
        self.cipher.as_ref()
    }

    /// Create or update the store at `path`.
    ///
    /// A new file is encrypted to `options.recipients` in `options.format`.
    /// An existing file is decrypted with `options.identity`, merged with
    /// `secrets` (incoming values win) and re-encrypted to its own
    /// recipients. A sops envelope keeps every key group it had (age, PGP,
    /// cloud KMS, Vault). Nothing is written unless every step succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidSecretName` / `InvalidSecretValue` for bad input
    /// - `MissingRecipients` for a new file without recipients
    /// - `MissingIdentity` for an existing file without an identity
    /// - `RecipientMismatch` if supplied recipients differ from the envelope's
    /// - any backend error from decryption or encryption
    pub fn put(&self, path: &Path, secrets: &Secrets, options: &PutOptions) -> Result<()> {
        for (name, value) in secrets {
            validate_name(name)?;
            validate_value(name, value)?;
        }
        let supplied = options.recipients.as_deref().map(normalize_recipients);

        let bytes = match detect(path)? {
            Detected::NewFile => {
                let recipients = supplied.ok_or(Error::MissingRecipients)?;
                if recipients.is_empty() {
                    return Err(Error::MissingRecipients);
                }
                debug!(
                    path = %path.display(),
                    format = %options.format,
                    recipients = recipients.len(),
                    count = secrets.len(),
                    "creating store"
                );
                match options.format {
                    Format::Custom => self.seal_custom(&recipients, None, secrets)?,
                    Format::ThirdParty => {
                        self.seal_third_party(&KeyGroups::age(&recipients), secrets)?
                    }
                }
            }
            Detected::Existing(envelope) => {
                let existing = envelope.recipients().to_vec();
                if let Some(supplied) = supplied {
                    if !same_recipients(&existing, &supplied) {
                        return Err(Error::RecipientMismatch { existing, supplied });
                    }
                }
                let identity = options.identity.as_ref().ok_or(Error::MissingIdentity)?;
                if envelope.format() != options.format {
                    debug!(
                        requested = %options.format,
                        actual = %envelope.format(),
                        "keeping the existing envelope format"
                    );
                }

                let mut merged = self.open(&envelope, Some(identity), None)?;

                debug!(
                    path = %path.display(),
                    format = %envelope.format(),
                    existing = merged.len(),
                    incoming = secrets.len(),
                    "updating store"
                );
                for (name, value) in secrets {
                    merged.insert(name.clone(), value.clone());
                }
                match &envelope {
                    Envelope::Custom(custom) => {
                        let created = Some(custom.created.clone()).filter(|c| !c.is_empty());
                        self.seal_custom(&existing, created, &merged)?
                    }
                    Envelope::ThirdParty(third_party) => {
                        self.seal_third_party(third_party.key_groups(), &merged)?
                    }
                }
            }
        };

        atomic::write(path, &bytes)
    }

    /// Decrypt `envelope`, resolving `identity` only for as long as the
    /// backend call needs it.
    ///
    /// A sops envelope with no age key group is opened by sops' own key
    /// resolution, so it needs no identity.
    fn open(
        &self,
        envelope: &Envelope,
        identity: Option<&IdentityRef>,
        names: Option<&[String]>,
    ) -> Result<Secrets> {
        match envelope {
            Envelope::Custom(custom) => {
                let identity = identity.ok_or(Error::MissingIdentity)?;
                let scoped = ScopedIdentity::resolve(self.cipher(), identity)?;
                custom.open(self.cipher(), scoped.path(), names)
            }
            Envelope::ThirdParty(third_party) => {
                let scoped = match identity {
                    Some(identity) => Some(ScopedIdentity::resolve(self.cipher(), identity)?),
                    None if third_party.is_asymmetric() => return Err(Error::MissingIdentity),
                    None => None,
                };
                third_party.open(
                    self.manager.as_ref(),
                    scoped.as_ref().map(ScopedIdentity::path),
                )
            }
        }
    }

    fn seal_custom(
        &self,
        recipients: &[PublicKey],
        created: Option<String>,
        secrets: &Secrets,
    ) -> Result<Vec<u8>> {
        let envelope = CustomEnvelope::seal(self.cipher(), recipients, created, secrets)?;
        Ok(envelope.to_yaml()?.into_bytes())
    }

    fn seal_third_party(&self, keys: &KeyGroups, secrets: &Secrets) -> Result<Vec<u8>> {
        let envelope = ThirdPartyEnvelope::seal(self.manager.as_ref(), keys, secrets)?;
        Ok(envelope.raw().to_vec())
    }

    /// Read secrets from the store at `path`.
    ///
    /// With `names`, only those secrets are returned; names not in the store
    /// become [`Warning::MissingName`] rather than errors.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if nothing is stored at `path`
    /// - `MalformedEnvelope` if the file is not a recognizable envelope
    /// - `MissingIdentity` if the envelope needs an identity and none was given
    /// - `AuthFailure` / `DecryptionFailed` from the backend
    pub fn get(
        &self,
        path: &Path,
        identity: Option<&IdentityRef>,
        names: Option<&[String]>,
    ) -> Result<Retrieved> {
        let envelope = match detect(path)? {
            Detected::NewFile => return Err(Error::FileNotFound(path.to_path_buf())),
            Detected::Existing(envelope) => envelope,
        };
        debug!(path = %path.display(), format = %envelope.format(), "reading store");

        let mut secrets = self.open(&envelope, identity, names)?;

        let mut warnings = Vec::new();
        if let Some(names) = names {
            secrets.retain(|name, _| names.contains(name));
            for name in names {
                let missing = Warning::MissingName(name.clone());
                if !secrets.contains_key(name) && !warnings.contains(&missing) {
                    warn!(name = %name, "secret not found in store");
                    warnings.push(missing);
                }
            }
        }

        debug!(count = secrets.len(), warnings = warnings.len(), "store read");
        Ok(Retrieved { secrets, warnings })
    }

    /// Recipients and format of the store at `path`, without decrypting.
    ///
    /// # Errors
    ///
    /// `FileNotFound` if nothing is stored at `path`.
    pub fn recipients(&self, path: &Path) -> Result<(Format, Vec<PublicKey>)> {
        match detect(path)? {
            Detected::NewFile => Err(Error::FileNotFound(path.to_path_buf())),
            Detected::Existing(envelope) => {
                Ok((envelope.format(), envelope.recipients().to_vec()))
            }
        }
    }

    /// Read every secret and set it as an environment variable of this
    /// process, overwriting existing values.
    ///
    /// The returned [`Exported`] remembers the previous values so the caller
    /// can put them back.
    ///
    /// # Errors
    ///
    /// Any error of [`get`](Self::get), or `InvalidSecretName` /
    /// `InvalidSecretValue` for an entry that cannot be an environment
    /// variable. On error no variable has been set.
    pub fn export(&self, path: &Path, identity: Option<&IdentityRef>) -> Result<Exported> {
        let retrieved = self.get(path, identity, None)?;
        Exported::apply(&retrieved.secrets)
    }
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("cipher", &self.cipher.name())
            .field("manager", &self.manager.name())
            .finish()
    }
}
