//! lockbox - encrypted secret stores on top of age and sops.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── secrets       # put / get / recipients
//! │   ├── run           # Run with exported secrets
//! │   ├── files         # encrypt / decrypt
//! │   ├── keygen        # Identity generation
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # config.toml management
//!     ├── cipher/       # Encryption backends
//!     │   ├── mod       # Cipher trait
//!     │   ├── cli       # age / age-keygen binaries
//!     │   └── native    # age crate
//!     ├── sops          # Secrets-manager backend
//!     ├── envelope/     # Format detection
//!     │   ├── custom    # Per-value age envelope
//!     │   └── third_party # sops document
//!     ├── identity      # Key references and scoped resolution
//!     ├── store/        # put / get / export
//!     └── files         # Whole-file encryption
//! ```
//!
//! # Features
//!
//! - Format auto-detection: the file content says how to read it
//! - Merge-on-write updates that never change recipients silently
//! - Atomic replacement of store files
//! - Passphrase-protected identities, unlocked into scoped temp files
//! - age via the CLI binaries or in-process

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::envelope::Format;
pub use crate::core::identity::IdentityRef;
pub use crate::core::store::{Exported, PutOptions, Retrieved, SecretStore, Warning};
pub use crate::error::{Error, Result};
