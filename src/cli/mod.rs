//! Command-line interface.

pub mod completions;
pub mod files;
pub mod keygen;
pub mod output;
pub mod run;
pub mod secrets;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Password;
use zeroize::Zeroizing;

use crate::core::config::{BackendKind, Config};
use crate::core::constants::SECRET_KEY_PREFIX;
use crate::core::envelope::Format;
use crate::core::identity::IdentityRef;
use crate::core::store::SecretStore;
use crate::error::{Error, Result};

/// Environment variable read by `--passphrase` before prompting.
pub const PASSPHRASE_ENV: &str = "LOCKBOX_PASSPHRASE";

/// lockbox - encrypted secret stores on top of age and sops.
#[derive(Parser)]
#[command(
    name = "lockbox",
    about = "Encrypted secret stores and file encryption on top of age and sops",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Encryption backend (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create or update secrets in a store
    Put {
        /// Store file
        file: PathBuf,
        /// Secrets as NAME=VALUE
        #[arg(required = true, value_name = "NAME=VALUE")]
        pairs: Vec<String>,
        /// Recipient public key (required for a new store)
        #[arg(short, long = "recipient")]
        recipients: Vec<String>,
        #[command(flatten)]
        unlock: IdentityArgs,
        /// Format of a new store
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print secrets from a store
    Get {
        /// Store file
        file: PathBuf,
        /// Only these names
        names: Vec<String>,
        #[command(flatten)]
        unlock: IdentityArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a command with the store's secrets as environment variables
    Run {
        /// Store file
        file: PathBuf,
        #[command(flatten)]
        unlock: IdentityArgs,
        /// Command and arguments to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Show the format and recipients of a store
    Recipients {
        /// Store file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a new age identity
    Keygen {
        /// Write the key file here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encrypt a file to recipients or a passphrase
    Encrypt {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Recipient public key
        #[arg(short, long = "recipient", required_unless_present = "passphrase")]
        recipients: Vec<String>,
        /// Encrypt with a passphrase instead of recipients
        #[arg(short, long, conflicts_with = "recipients")]
        passphrase: bool,
        /// ASCII-armor the output
        #[arg(short, long)]
        armor: bool,
    },

    /// Decrypt a file with an identity or a passphrase
    Decrypt {
        input: PathBuf,
        /// Write plaintext here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Identity file or inline AGE-SECRET-KEY
        #[arg(short, long, env = "LOCKBOX_IDENTITY")]
        identity: Option<String>,
        /// The identity file is passphrase-protected
        #[arg(long, conflicts_with = "passphrase")]
        identity_passphrase: bool,
        /// Decrypt with a passphrase instead of an identity
        #[arg(short, long)]
        passphrase: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Identity options shared by store commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// Identity file or inline AGE-SECRET-KEY
    #[arg(short, long, env = "LOCKBOX_IDENTITY")]
    pub identity: Option<String>,
    /// The identity file is passphrase-protected
    #[arg(short, long)]
    pub passphrase: bool,
}

/// Backend choice on the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BackendArg {
    AgeCli,
    Native,
}

/// Envelope format on the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Custom,
    ThirdParty,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Custom => Format::Custom,
            FormatArg::ThirdParty => Format::ThirdParty,
        }
    }
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Loaded configuration plus command-line overrides.
pub struct Context {
    pub config: Config,
}

impl Context {
    /// Load the config file and apply `--backend`.
    pub fn load(backend: Option<BackendArg>) -> Result<Self> {
        let mut config = Config::load()?;
        if let Some(backend) = backend {
            config.backend.kind = match backend {
                BackendArg::AgeCli => BackendKind::AgeCli,
                BackendArg::Native => BackendKind::Native,
            };
        }
        Ok(Self { config })
    }

    pub fn store(&self) -> SecretStore {
        SecretStore::from_config(&self.config)
    }

    /// Identity from the flags, falling back to `defaults.identity`.
    pub fn identity(&self, args: &IdentityArgs) -> Result<Option<IdentityRef>> {
        let identity = match &args.identity {
            Some(value) if value.trim_start().starts_with(SECRET_KEY_PREFIX) => {
                IdentityRef::inline(value.trim())
            }
            Some(value) => IdentityRef::file(value),
            None => match &self.config.defaults.identity {
                Some(path) => IdentityRef::file(path),
                None => return Ok(None),
            },
        };

        if args.passphrase {
            let passphrase = read_passphrase("Identity passphrase", false)?;
            return Ok(Some(identity.with_passphrase(passphrase.as_str())));
        }
        Ok(Some(identity))
    }
}

/// Read a passphrase from `$LOCKBOX_PASSPHRASE`, stdin or an interactive prompt.
pub fn read_passphrase(prompt: &str, confirm: bool) -> Result<Zeroizing<String>> {
    if let Some(value) = std::env::var_os(PASSPHRASE_ENV) {
        let value = value.into_string().map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not valid UTF-8", PASSPHRASE_ENV),
            ))
        })?;
        return Ok(Zeroizing::new(value));
    }

    if !io::stdin().is_terminal() {
        let mut input = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut input)?;
        return Ok(Zeroizing::new(input.trim_end_matches(&['\r', '\n'][..]).to_string()));
    }

    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation("Confirm passphrase", "passphrases do not match");
    }
    let value = password.interact()?;
    Ok(Zeroizing::new(value))
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let ctx = Context::load(cli.backend)?;
    match cli.command {
        Put {
            file,
            pairs,
            recipients,
            unlock,
            format,
        } => secrets::put(&ctx, &file, &pairs, recipients, &unlock, format.map(Format::from)),
        Get {
            file,
            names,
            unlock,
            json,
        } => secrets::get(&ctx, &file, &names, &unlock, json),
        Run {
            file,
            unlock,
            command,
        } => run::execute(&ctx, &file, &unlock, &command),
        Recipients { file, json } => secrets::recipients(&ctx, &file, json),
        Keygen { output } => keygen::execute(&ctx, output.as_deref()),
        Encrypt {
            input,
            output,
            recipients,
            passphrase,
            armor,
        } => files::encrypt(&ctx, &input, &output, recipients, passphrase, armor),
        Decrypt {
            input,
            output,
            identity,
            identity_passphrase,
            passphrase,
        } => {
            let args = IdentityArgs {
                identity,
                passphrase: identity_passphrase,
            };
            files::decrypt(&ctx, &input, output.as_deref(), &args, passphrase)
        }
        Completions { shell } => completions::execute(shell),
    }
}
