//! Keygen command.

use std::path::Path;

use crate::cli::{output, Context};
use crate::core::cipher::{Cipher, CipherBackend};
use crate::error::Result;

/// Generate an identity, writing it to `output` or printing it.
pub fn execute(ctx: &Context, output_path: Option<&Path>) -> Result<()> {
    let backend = CipherBackend::from_config(&ctx.config);
    let generated = backend.generate_identity(output_path)?;

    match output_path {
        Some(path) => {
            output::success(&format!("wrote identity to {}", output::path(path)));
            output::kv("public key:", &generated.public);
        }
        None => {
            print!("{}", generated.to_key_file().as_str());
            output::success(&format!("public key: {}", generated.public));
        }
    }
    Ok(())
}
