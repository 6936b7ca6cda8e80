//! Envelope formats and detection.
//!
//! A secret store file is one of two YAML layouts:
//!
//! - **custom**: lockbox metadata keys plus one armored age blob per secret
//! - **third-party**: a sops document, recognized by its `sops` block
//!
//! The format is never recorded anywhere else; [`detect`] reads it from the
//! file contents once per operation and hands back the parsed variant.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::core::constants::{KEY_VERSION, SOPS_METADATA_KEY};
use crate::core::types::PublicKey;
use crate::error::{Error, Result};

mod custom;
mod third_party;

pub use custom::CustomEnvelope;
pub use third_party::ThirdPartyEnvelope;

/// Envelope format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// Per-value age encryption with lockbox metadata
    #[default]
    Custom,
    /// Whole-document sops encryption
    ThirdParty,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom => write!(f, "custom"),
            Self::ThirdParty => write!(f, "third-party"),
        }
    }
}

/// A parsed envelope of either format.
#[derive(Debug, Clone)]
pub enum Envelope {
    Custom(CustomEnvelope),
    ThirdParty(ThirdPartyEnvelope),
}

impl Envelope {
    pub fn format(&self) -> Format {
        match self {
            Self::Custom(_) => Format::Custom,
            Self::ThirdParty(_) => Format::ThirdParty,
        }
    }

    /// Recipients the envelope is currently encrypted to.
    pub fn recipients(&self) -> &[PublicKey] {
        match self {
            Self::Custom(envelope) => &envelope.recipients,
            Self::ThirdParty(envelope) => envelope.recipients(),
        }
    }
}

/// Result of inspecting a store path.
#[derive(Debug, Clone)]
pub enum Detected {
    /// Nothing at the path yet
    NewFile,
    Existing(Envelope),
}

impl Detected {
    /// Format of an existing envelope, `None` for a new file.
    pub fn format(&self) -> Option<Format> {
        match self {
            Self::NewFile => None,
            Self::Existing(envelope) => Some(envelope.format()),
        }
    }
}

/// Inspect `path` and parse whatever envelope it holds.
///
/// # Errors
///
/// Returns `Error::MalformedEnvelope` for content that is not a YAML mapping
/// or carries neither a `sops` block nor `lockbox_version`, and `Error::Io`
/// if the file exists but cannot be read.
pub fn detect(path: &Path) -> Result<Detected> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no envelope yet");
            return Ok(Detected::NewFile);
        }
        Err(e) => return Err(e.into()),
    };

    let envelope = parse(path, raw)?;
    debug!(path = %path.display(), format = %envelope.format(), "detected envelope");
    Ok(Detected::Existing(envelope))
}

/// Classify and parse envelope bytes read from `path`.
pub(crate) fn parse(path: &Path, raw: Vec<u8>) -> Result<Envelope> {
    let document: Value = serde_yaml::from_slice(&raw)
        .map_err(|e| Error::malformed(path, format!("not valid YAML: {}", e)))?;
    let Value::Mapping(mapping) = document else {
        return Err(Error::malformed(path, "top level is not a mapping"));
    };

    if mapping.contains_key(SOPS_METADATA_KEY) {
        ThirdPartyEnvelope::from_document(path, raw, &mapping).map(Envelope::ThirdParty)
    } else if mapping.contains_key(KEY_VERSION) {
        CustomEnvelope::from_mapping(path, &mapping).map(Envelope::Custom)
    } else {
        Err(Error::malformed(
            path,
            format!("neither a '{}' block nor '{}'", SOPS_METADATA_KEY, KEY_VERSION),
        ))
    }
}

/// Render a scalar node as text; `None` for null, sequences and mappings.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

/// Read a list of strings from an optional sequence node.
pub(crate) fn string_list(mapping: &Mapping, key: &str) -> Option<Vec<String>> {
    match mapping.get(key)? {
        Value::Sequence(items) => items.iter().map(scalar_text).collect(),
        _ => None,
    }
}
