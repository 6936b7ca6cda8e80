//! Input validation for lockbox operations.
//!
//! Validates secret names, values, recipient lists and key file permissions.

use crate::core::constants::RESERVED_KEYS;
use crate::error::{Error, Result};

/// Validate a secret name.
///
/// Names are case-sensitive and otherwise free-form, with three limits:
/// - Cannot be empty
/// - Cannot contain `=` or NUL (they must be exportable as env var names)
/// - Cannot be one of the reserved envelope keys
///
/// # Errors
///
/// Returns `Error::InvalidSecretName` if the name is invalid.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name cannot be empty"
    } else if name.contains('=') {
        "name cannot contain '='"
    } else if name.contains('\0') {
        "name cannot contain NUL"
    } else if RESERVED_KEYS.contains(&name) {
        "name is reserved for envelope metadata"
    } else {
        return Ok(());
    };

    Err(Error::InvalidSecretName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Validate a secret value.
///
/// Values must be a non-empty, single-line scalar.
///
/// # Errors
///
/// Returns `Error::InvalidSecretValue` if the value is empty or spans lines.
pub fn validate_value(name: &str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "value cannot be empty"
    } else if value.contains('\n') || value.contains('\r') {
        "value must be a single line"
    } else {
        return Ok(());
    };

    Err(Error::InvalidSecretValue {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Normalize a recipient list: trim entries, drop blanks and duplicates,
/// keep first-seen order.
pub fn normalize_recipients<S: AsRef<str>>(recipients: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(recipients.len());
    for r in recipients {
        let r = r.as_ref().trim();
        if !r.is_empty() && !out.iter().any(|seen| seen == r) {
            out.push(r.to_string());
        }
    }
    out
}

/// True if both recipient lists hold the same set of keys.
pub fn same_recipients(a: &[String], b: &[String]) -> bool {
    use std::collections::BTreeSet;
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

/// Validate file permissions (Unix only).
///
/// Returns the actual mode when it differs from `expected_mode`.
#[cfg(unix)]
pub fn check_file_permissions(path: &std::path::Path, expected_mode: u32) -> Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let actual_mode = metadata.permissions().mode() & 0o777;

    if actual_mode & !expected_mode != 0 {
        return Ok(Some(actual_mode));
    }

    Ok(None)
}
