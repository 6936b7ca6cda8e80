//! Core library components.
//!
//! Backends, envelope formats and the secret store built on them. Nothing
//! here prints; the CLI layer owns all terminal output.

pub mod atomic;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod files;
pub mod identity;
pub(crate) mod scratch;
pub mod sops;
pub mod store;
pub mod types;
pub mod validation;
