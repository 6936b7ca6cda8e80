//! Environment export.
//!
//! The one place lockbox touches process state. Every variable it sets is
//! recorded together with the value it replaced.

use std::collections::BTreeMap;
use std::ffi::OsString;

use tracing::debug;

use crate::core::types::Secrets;
use crate::core::validation::validate_name;
use crate::error::{Error, Result};

/// Variables written by [`SecretStore::export`](super::SecretStore::export).
#[derive(Debug, Default)]
#[must_use = "dropping Exported leaves the variables set; call restore() to undo"]
pub struct Exported {
    previous: BTreeMap<String, Option<OsString>>,
}

impl Exported {
    /// Set one environment variable per secret.
    ///
    /// All names and values are checked before the first variable is set.
    pub(crate) fn apply(secrets: &Secrets) -> Result<Self> {
        for (name, value) in secrets {
            validate_name(name)?;
            if value.contains('\0') {
                return Err(Error::InvalidSecretValue {
                    name: name.clone(),
                    reason: "value cannot contain NUL".to_string(),
                });
            }
        }

        let mut previous = BTreeMap::new();
        for (name, value) in secrets {
            previous.insert(name.clone(), std::env::var_os(name));
            std::env::set_var(name, value.as_str());
        }
        debug!(count = previous.len(), "exported secrets to environment");

        Ok(Self { previous })
    }

    /// Names of the variables that were set.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.previous.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Put every variable back to the value it had before the export.
    pub fn restore(self) {
        for (name, old) in &self.previous {
            match old {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
        debug!(count = self.previous.len(), "restored environment");
    }
}
