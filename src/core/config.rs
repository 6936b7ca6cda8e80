//! Configuration file management.
//!
//! Handles reading and validating the lockbox `config.toml`. Every section
//! is optional; a missing file means defaults.
//!
//! ```toml
//! [backend]
//! kind = "age-cli"        # or "native"
//! age = "age"
//! age_keygen = "age-keygen"
//!
//! [sops]
//! binary = "sops"
//!
//! [defaults]
//! format = "custom"       # or "third-party"
//! armor = false
//! identity = "/home/me/.config/lockbox/key.txt"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::core::envelope::Format;
use crate::error::{ConfigError, Result};

/// lockbox configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encryption backend selection
    pub backend: BackendConfig,
    /// sops settings
    pub sops: SopsConfig,
    /// Defaults applied when the caller does not say otherwise
    pub defaults: Defaults,
}

/// Which encryption backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Shell out to the `age` binaries
    #[default]
    AgeCli,
    /// In-process `age` crate
    Native,
}

/// `[backend]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// `age` binary name or path
    pub age: String,
    /// `age-keygen` binary name or path
    pub age_keygen: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            age: "age".to_string(),
            age_keygen: "age-keygen".to_string(),
        }
    }
}

/// `[sops]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SopsConfig {
    /// `sops` binary name or path
    pub binary: String,
}

impl Default for SopsConfig {
    fn default() -> Self {
        Self {
            binary: "sops".to_string(),
        }
    }
}

/// `[defaults]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Format for newly created envelopes
    pub format: Format,
    /// ASCII-armor output of `encrypt`
    pub armor: bool,
    /// Identity file used when none is given
    pub identity: Option<PathBuf>,
}

impl Config {
    /// Default config location: `$LOCKBOX_CONFIG`, else
    /// `<config_dir>/lockbox/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(constants::CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("lockbox").join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// A missing file at the platform location yields defaults; a file named
    /// by `$LOCKBOX_CONFIG` must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(constants::CONFIG_ENV).is_some();
        match Self::default_path() {
            Some(path) if explicit || path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read,
    /// `ConfigError::Parse` if the TOML is malformed, or
    /// `ConfigError::InvalidValue` on validation failure.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(
            backend = ?config.backend.kind,
            format = ?config.defaults.format,
            "config loaded"
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for empty binary names.
    pub fn validate(&self) -> Result<()> {
        let binaries = [
            ("backend.age", &self.backend.age),
            ("backend.age_keygen", &self.backend.age_keygen),
            ("sops.binary", &self.sops.binary),
        ];
        for (field, value) in binaries {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "binary name cannot be empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
