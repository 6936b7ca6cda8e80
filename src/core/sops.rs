//! sops secrets-manager backend.
//!
//! sops encrypts a whole YAML document: keys stay readable, values become
//! `ENC[...]` nodes, and a top-level `sops` block records how the data key
//! is wrapped for each key group (age, PGP, cloud KMS, Vault transit).
//!
//! ## Requirements
//!
//! - `sops` CLI must be installed (https://github.com/getsops/sops)
//! - age identities are handed to sops through `SOPS_AGE_KEY_FILE` on the
//!   child process only

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::trace;
use zeroize::Zeroizing;

use crate::core::cipher::process::{locate, run, stderr_text};
use crate::core::constants::SOPS_AGE_KEY_FILE;
use crate::core::scratch::ScratchFile;
use crate::core::types::PublicKey;
use crate::error::{Error, Result};

/// sops exit code for "failed to get the data key".
const EXIT_COULD_NOT_RETRIEVE_KEY: i32 = 128;

/// Whole-document secrets manager contract.
pub trait SecretsManager {
    /// Backend name for display.
    fn name(&self) -> &'static str;

    /// Encrypt a plaintext YAML document so every key in `keys` can
    /// unwrap its data key.
    fn encrypt_document(&self, plaintext_yaml: &[u8], keys: &KeyGroups) -> Result<Vec<u8>>;

    /// Decrypt an envelope back to plaintext YAML.
    ///
    /// # Errors
    ///
    /// `AuthFailure` if no key can unwrap the data key, `DecryptionFailed`
    /// for any other decryption problem.
    fn decrypt_document(
        &self,
        envelope: &[u8],
        identity_path: Option<&Path>,
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// age recipient entry of a `sops` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeKey {
    pub recipient: PublicKey,
}

/// PGP entry, identified by fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgpKey {
    pub fp: String,
}

/// AWS KMS entry, optionally assuming a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsKey {
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// GCP KMS entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpKmsKey {
    pub resource_id: String,
}

/// Azure Key Vault entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureKvKey {
    pub vault_url: String,
    pub name: String,
    pub version: String,
}

/// HashiCorp Vault transit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HcVaultKey {
    pub vault_address: String,
    pub engine_path: String,
    pub key_name: String,
}

/// Every key group a sops document is encrypted to.
///
/// Field names follow the `sops` metadata block, so the struct reads
/// straight out of an envelope and an update can hand the same groups back
/// to the encryptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGroups {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub age: Vec<AgeKey>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub pgp: Vec<PgpKey>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub kms: Vec<KmsKey>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub gcp_kms: Vec<GcpKmsKey>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub azure_kv: Vec<AzureKvKey>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub hc_vault: Vec<HcVaultKey>,
}

/// Older sops versions write `kms: null` for an unused group.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl KeyGroups {
    /// Key groups holding only age recipients.
    pub fn age(recipients: &[PublicKey]) -> Self {
        Self {
            age: recipients
                .iter()
                .map(|r| AgeKey {
                    recipient: r.clone(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Read the key groups of a `sops` metadata block.
    ///
    /// Entries of other kinds and bookkeeping fields (`enc`, `mac`,
    /// `lastmodified`, ...) are ignored.
    pub fn from_metadata(metadata: &Mapping) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_value(Value::Mapping(metadata.clone()))
    }

    /// age recipients, in document order.
    pub fn recipients(&self) -> Vec<PublicKey> {
        self.age
            .iter()
            .map(|k| k.recipient.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
            && self.pgp.is_empty()
            && self.kms.is_empty()
            && self.gcp_kms.is_empty()
            && self.azure_kv.is_empty()
            && self.hc_vault.is_empty()
    }

    /// Key selection flags for `sops --encrypt`, one flag per non-empty
    /// group with comma-separated values.
    pub(crate) fn cli_args(&self) -> Vec<String> {
        let groups: [(&str, Vec<String>); 6] = [
            ("--age", self.recipients()),
            ("--pgp", self.pgp.iter().map(|k| k.fp.clone()).collect()),
            (
                "--kms",
                self.kms
                    .iter()
                    .map(|k| match k.role.as_deref() {
                        Some(role) if !role.is_empty() => format!("{}+{}", k.arn, role),
                        _ => k.arn.clone(),
                    })
                    .collect(),
            ),
            (
                "--gcp-kms",
                self.gcp_kms.iter().map(|k| k.resource_id.clone()).collect(),
            ),
            (
                "--azure-kv",
                self.azure_kv
                    .iter()
                    .map(|k| {
                        format!(
                            "{}/keys/{}/{}",
                            k.vault_url.trim_end_matches('/'),
                            k.name,
                            k.version
                        )
                    })
                    .collect(),
            ),
            (
                "--hc-vault-transit",
                self.hc_vault
                    .iter()
                    .map(|k| {
                        format!(
                            "{}/v1/{}/keys/{}",
                            k.vault_address.trim_end_matches('/'),
                            k.engine_path.trim_matches('/'),
                            k.key_name
                        )
                    })
                    .collect(),
            ),
        ];

        let mut args = Vec::new();
        for (flag, values) in groups {
            if !values.is_empty() {
                args.push(flag.to_string());
                args.push(values.join(","));
            }
        }
        args
    }
}

/// sops backend using the sops CLI
#[derive(Debug, Clone)]
pub struct SopsCli {
    binary: String,
}

impl Default for SopsCli {
    fn default() -> Self {
        Self::new("sops")
    }
}

impl SopsCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Result<Command> {
        let mut cmd = Command::new(locate(&self.binary)?);
        cmd.args(["--input-type", "yaml", "--output-type", "yaml"]);
        Ok(cmd)
    }
}

impl SecretsManager for SopsCli {
    fn name(&self) -> &'static str {
        "sops"
    }

    fn encrypt_document(&self, plaintext_yaml: &[u8], keys: &KeyGroups) -> Result<Vec<u8>> {
        trace!(
            age = keys.age.len(),
            pgp = keys.pgp.len(),
            kms = keys.kms.len(),
            plaintext_len = plaintext_yaml.len(),
            "encrypting document with sops"
        );

        if keys.is_empty() {
            return Err(Error::backend(&self.binary, "no key groups to encrypt to"));
        }

        // sops reads documents from a path; the plaintext never outlives this call.
        let plaintext = ScratchFile::create(plaintext_yaml, ".yaml")?;

        let mut cmd = self.command()?;
        cmd.arg("--encrypt").args(keys.cli_args()).arg(plaintext.path());

        let output = run(&self.binary, cmd, None)?;
        if !output.status.success() {
            return Err(Error::backend(&self.binary, stderr_text(&output)));
        }
        Ok(output.stdout)
    }

    fn decrypt_document(
        &self,
        envelope: &[u8],
        identity_path: Option<&Path>,
    ) -> Result<Zeroizing<Vec<u8>>> {
        trace!(envelope_len = envelope.len(), "decrypting document with sops");

        let input = ScratchFile::create(envelope, ".yaml")?;

        let mut cmd = self.command()?;
        cmd.arg("--decrypt").arg(input.path());
        if let Some(identity) = identity_path {
            cmd.env(SOPS_AGE_KEY_FILE, identity);
        }

        let output = run(&self.binary, cmd, None)?;
        if !output.status.success() {
            let reason = stderr_text(&output);
            return Err(match output.status.code() {
                Some(EXIT_COULD_NOT_RETRIEVE_KEY) => Error::AuthFailure(reason),
                _ => Error::DecryptionFailed(reason),
            });
        }
        Ok(Zeroizing::new(output.stdout))
    }
}

/// Keeps the document in the clear and records the key groups it was given
/// in the `sops` block. Unit tests only.
#[cfg(test)]
pub(crate) struct Cleartext;

#[cfg(test)]
impl SecretsManager for Cleartext {
    fn name(&self) -> &'static str {
        "cleartext"
    }

    fn encrypt_document(&self, plaintext_yaml: &[u8], keys: &KeyGroups) -> Result<Vec<u8>> {
        let mut document: Mapping = serde_yaml::from_slice(plaintext_yaml)?;
        document.insert(
            crate::core::constants::SOPS_METADATA_KEY.into(),
            serde_yaml::to_value(keys)?,
        );
        Ok(serde_yaml::to_string(&document)?.into_bytes())
    }

    fn decrypt_document(&self, envelope: &[u8], _: Option<&Path>) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(envelope.to_vec()))
    }
}
