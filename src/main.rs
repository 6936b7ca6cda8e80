//! lockbox - encrypted secret stores on top of age and sops.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lockbox::cli::output;
use lockbox::cli::{execute, Cli, LogFormat};
use lockbox::core::constants::LOG_ENV;
use lockbox::error::Error;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("lockbox=debug")
        } else {
            EnvFilter::new("lockbox=warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::MissingRecipients => Some("pass --recipient <age1...> to create a store"),
            Error::MissingIdentity => Some("pass --identity <key file> or set LOCKBOX_IDENTITY"),
            Error::MissingPassphrase => {
                Some("pass --passphrase (--identity-passphrase for decrypt) or set LOCKBOX_PASSPHRASE")
            },
            Error::RecipientMismatch { .. } => {
                Some("omit --recipient to keep the store's recipients")
            }
            Error::BackendUnavailable { tool } if tool.contains("sops") => {
                Some("install sops: https://github.com/getsops/sops")
            }
            Error::BackendUnavailable { .. } => Some("install age or use --backend native"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
