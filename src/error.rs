//! Error types.
//!
//! One flat taxonomy for store and backend failures, with configuration
//! problems nested under [`ConfigError`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for all lockbox operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("malformed envelope {}: {reason}", path.display())]
    MalformedEnvelope { path: PathBuf, reason: String },

    #[error("no recipients given for a new envelope")]
    MissingRecipients,

    #[error("an identity is required to update or read this envelope")]
    MissingIdentity,

    #[error("identity file is encrypted and no passphrase was given")]
    MissingPassphrase,

    #[error("recipients do not match the envelope (existing: {}, given: {})", existing.join(", "), supplied.join(", "))]
    RecipientMismatch {
        existing: Vec<String>,
        supplied: Vec<String>,
    },

    #[error("invalid value for secret '{name}': {reason}")]
    InvalidSecretValue { name: String, reason: String },

    #[error("invalid secret name '{name}': {reason}")]
    InvalidSecretName { name: String, reason: String },

    #[error("{tool} is not installed or not on PATH")]
    BackendUnavailable { tool: String },

    #[error("{tool} failed: {reason}")]
    BackendError { tool: String, reason: String },

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    pub(crate) fn backend(tool: &str, reason: impl Into<String>) -> Self {
        Self::BackendError {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by a key that does not fit the ciphertext.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure(_))
    }
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
