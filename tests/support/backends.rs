//! Stand-in backends.
//!
//! `FakeSops` mimics the outline of a sops document: values are masked and
//! the `sops` block lists every key group it was asked to encrypt to. When
//! there is an age group the real payload is age-encrypted in-process, so
//! only a matching identity can read it back; otherwise it is kept in the
//! clear, standing in for sops' own KMS or PGP key resolution.
//!
//! `Failing` wraps a real cipher and errors on every encryption, for
//! checking that a failed write leaves the store untouched.

use std::path::Path;

use lockbox::core::cipher::{Cipher, GeneratedIdentity, NativeAge};
use lockbox::core::sops::{KeyGroups, SecretsManager};
use lockbox::core::types::PublicKey;
use lockbox::{Error, Result};
use serde_yaml::{Mapping, Value};
use zeroize::Zeroizing;

const PAYLOAD: &str = "fake_payload";

pub struct FakeSops;

impl SecretsManager for FakeSops {
    fn name(&self) -> &'static str {
        "fake-sops"
    }

    fn encrypt_document(&self, plaintext_yaml: &[u8], keys: &KeyGroups) -> Result<Vec<u8>> {
        if keys.is_empty() {
            return Err(Error::BackendError {
                tool: "fake-sops".to_string(),
                reason: "no key groups".to_string(),
            });
        }

        let plain: Mapping = serde_yaml::from_slice(plaintext_yaml)?;
        let mut doc = Mapping::new();
        for key in plain.keys() {
            doc.insert(key.clone(), Value::from("ENC[AES256_GCM,data:fake,type:str]"));
        }

        let recipients = keys.recipients();
        let payload = if recipients.is_empty() {
            String::from_utf8_lossy(plaintext_yaml).into_owned()
        } else {
            let sealed = NativeAge.encrypt_with_recipients(plaintext_yaml, &recipients, true)?;
            String::from_utf8_lossy(&sealed).into_owned()
        };

        let mut sops = match serde_yaml::to_value(keys)? {
            Value::Mapping(groups) => groups,
            _ => Mapping::new(),
        };
        sops.insert(Value::from(PAYLOAD), Value::from(payload));
        doc.insert(Value::from("sops"), Value::Mapping(sops));

        Ok(serde_yaml::to_string(&doc)?.into_bytes())
    }

    fn decrypt_document(
        &self,
        envelope: &[u8],
        identity_path: Option<&Path>,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let doc: Mapping = serde_yaml::from_slice(envelope)?;
        let sops = doc
            .get("sops")
            .and_then(Value::as_mapping)
            .ok_or_else(|| Error::DecryptionFailed("no sops block".to_string()))?;
        let payload = sops
            .get(PAYLOAD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::DecryptionFailed("no payload".to_string()))?;

        let keys = KeyGroups::from_metadata(sops)?;
        if keys.recipients().is_empty() {
            return Ok(Zeroizing::new(payload.as_bytes().to_vec()));
        }
        let identity = identity_path.ok_or(Error::MissingIdentity)?;
        NativeAge.decrypt_with_identity(payload.as_bytes(), identity)
    }
}

/// Secrets manager whose encryption always fails.
pub struct FailingSops;

impl SecretsManager for FailingSops {
    fn name(&self) -> &'static str {
        "failing-sops"
    }

    fn encrypt_document(&self, _: &[u8], _: &KeyGroups) -> Result<Vec<u8>> {
        Err(Error::BackendError {
            tool: "failing-sops".to_string(),
            reason: "simulated failure".to_string(),
        })
    }

    fn decrypt_document(
        &self,
        envelope: &[u8],
        identity_path: Option<&Path>,
    ) -> Result<Zeroizing<Vec<u8>>> {
        FakeSops.decrypt_document(envelope, identity_path)
    }
}

/// Cipher that decrypts normally but fails every encryption.
pub struct Failing;

impl Cipher for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn encrypt_with_recipients(&self, _: &[u8], _: &[PublicKey], _: bool) -> Result<Vec<u8>> {
        Err(Error::BackendError {
            tool: "failing".to_string(),
            reason: "simulated failure".to_string(),
        })
    }

    fn encrypt_with_passphrase(&self, _: &[u8], _: &str, _: bool) -> Result<Vec<u8>> {
        Err(Error::BackendError {
            tool: "failing".to_string(),
            reason: "simulated failure".to_string(),
        })
    }

    fn decrypt_with_identity(
        &self,
        ciphertext: &[u8],
        identity_path: &Path,
    ) -> Result<Zeroizing<Vec<u8>>> {
        NativeAge.decrypt_with_identity(ciphertext, identity_path)
    }

    fn decrypt_with_passphrase(
        &self,
        ciphertext: &[u8],
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        NativeAge.decrypt_with_passphrase(ciphertext, passphrase)
    }

    fn generate_identity(&self, output: Option<&Path>) -> Result<GeneratedIdentity> {
        NativeAge.generate_identity(output)
    }
}
