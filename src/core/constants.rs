//! Constants used throughout lockbox.
//!
//! Centralizes magic strings and configuration values.

/// Custom envelope: tool version marker (also the format discriminator).
pub const KEY_VERSION: &str = "lockbox_version";

/// Custom envelope: creation timestamp.
pub const KEY_CREATED: &str = "lockbox_created";

/// Custom envelope: recipient list.
pub const KEY_RECIPIENTS: &str = "lockbox_recipients";

/// Top-level metadata block written by sops.
pub const SOPS_METADATA_KEY: &str = "sops";

/// Top-level keys that can never be used as secret names.
pub const RESERVED_KEYS: &[&str] = &[KEY_VERSION, KEY_CREATED, KEY_RECIPIENTS, SOPS_METADATA_KEY];

/// First line of a binary age file.
pub const AGE_MAGIC: &[u8] = b"age-encryption.org/v1";

/// First line of an ASCII-armored age file.
pub const AGE_ARMOR_BEGIN: &[u8] = b"-----BEGIN AGE ENCRYPTED FILE-----";

/// Line prefix of an age x25519 private key.
pub const SECRET_KEY_PREFIX: &str = "AGE-SECRET-KEY-";

/// Environment variable sops reads an age identity file from.
pub const SOPS_AGE_KEY_FILE: &str = "SOPS_AGE_KEY_FILE";

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "LOCKBOX_CONFIG";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "LOCKBOX_LOG";
