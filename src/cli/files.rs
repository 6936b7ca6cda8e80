//! File commands: encrypt, decrypt.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::cli::{output, read_passphrase, Context, IdentityArgs};
use crate::core::cipher::CipherBackend;
use crate::core::files::{decrypt_file, decrypt_file_to, encrypt_file, Protection, Unlock};
use crate::error::{Error, Result};

/// Encrypt `input` to `output`.
pub fn encrypt(
    ctx: &Context,
    input: &Path,
    output_path: &Path,
    recipients: Vec<String>,
    passphrase: bool,
    armor: bool,
) -> Result<()> {
    let backend = CipherBackend::from_config(&ctx.config);
    let protection = if passphrase {
        Protection::Passphrase(read_passphrase("Passphrase", true)?)
    } else {
        Protection::Recipients(recipients)
    };

    encrypt_file(
        &backend,
        input,
        output_path,
        &protection,
        armor || ctx.config.defaults.armor,
    )?;
    output::success(&format!("encrypted to {}", output::path(output_path)));
    Ok(())
}

/// Decrypt `input` to `output`, or to stdout.
///
/// `passphrase` takes precedence over any identity, including one from
/// `$LOCKBOX_IDENTITY`.
pub fn decrypt(
    ctx: &Context,
    input: &Path,
    output_path: Option<&Path>,
    identity: &IdentityArgs,
    passphrase: bool,
) -> Result<()> {
    let backend = CipherBackend::from_config(&ctx.config);
    let unlock = if passphrase {
        if identity.identity.is_some() {
            debug!("passphrase given, ignoring identity");
        }
        Unlock::Passphrase(read_passphrase("Passphrase", false)?)
    } else {
        Unlock::Identity(ctx.identity(identity)?.ok_or(Error::MissingIdentity)?)
    };

    match output_path {
        Some(path) => {
            decrypt_file_to(&backend, input, path, &unlock)?;
            output::success(&format!("decrypted to {}", output::path(path)));
        }
        None => {
            let plaintext = decrypt_file(&backend, input, &unlock)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
