//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

use zeroize::Zeroizing;

/// A secret name (top-level key of an envelope).
pub type SecretName = String;

/// An encrypted secret value (age-armored ciphertext).
pub type EncryptedValue = String;

/// A recipient public key string (e.g. "age1...").
pub type PublicKey = String;

/// Plaintext secrets keyed by name, wiped from memory on drop.
pub type Secrets = BTreeMap<SecretName, Zeroizing<String>>;
