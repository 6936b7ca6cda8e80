//! Test support utilities for lockbox integration tests.
//!
//! Provides isolated test environments, stand-in backends and helper
//! commands.

#![allow(dead_code)]

pub mod assertions;
pub mod backends;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use backends::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use lockbox::core::cipher::{Cipher, NativeAge};
use lockbox::core::types::{PublicKey, Secrets};
use lockbox::{IdentityRef, SecretStore};
use tempfile::TempDir;
use zeroize::Zeroizing;

/// Test environment with isolated temp directories.
///
/// Each test gets its own working dir and home dir. No process-global state
/// is mutated; child processes get their environment explicitly.
pub struct Test {
    /// Temporary directory holding stores and keys
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self { dir, home }
    }

    /// Path of `name` inside the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Generate an identity file named `name`, returning its reference and
    /// public key.
    pub fn keypair(&self, name: &str) -> (IdentityRef, PublicKey) {
        let path = self.path(name);
        let generated = NativeAge
            .generate_identity(Some(&path))
            .expect("failed to generate identity");
        (IdentityRef::file(path), generated.public)
    }

    /// Store on the in-process age backend and the fake secrets manager.
    pub fn store(&self) -> SecretStore {
        SecretStore::new(NativeAge, FakeSops)
    }
}

/// Build a secret map from literal pairs.
pub fn secrets(pairs: &[(&str, &str)]) -> Secrets {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Zeroizing::new(v.to_string())))
        .collect()
}

/// Flatten a secret map for comparisons.
pub fn plain(secrets: &Secrets) -> Vec<(String, String)> {
    secrets
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect()
}
