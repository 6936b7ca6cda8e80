//! Store commands: put, get, recipients.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;
use zeroize::Zeroizing;

use crate::cli::{output, Context, IdentityArgs};
use crate::core::envelope::Format;
use crate::core::store::PutOptions;
use crate::core::types::Secrets;
use crate::error::{Error, Result};

/// Create or update secrets from `NAME=VALUE` pairs.
pub fn put(
    ctx: &Context,
    file: &Path,
    pairs: &[String],
    recipients: Vec<String>,
    unlock: &IdentityArgs,
    format: Option<Format>,
) -> Result<()> {
    let secrets = parse_pairs(pairs)?;
    info!(file = %file.display(), count = secrets.len(), "put");

    let options = PutOptions {
        recipients: (!recipients.is_empty()).then_some(recipients),
        identity: if file.exists() {
            ctx.identity(unlock)?
        } else {
            None
        },
        format: format.unwrap_or(ctx.config.defaults.format),
    };

    ctx.store().put(file, &secrets, &options)?;
    output::success(&format!(
        "stored {} secret{} in {}",
        secrets.len(),
        if secrets.len() == 1 { "" } else { "s" },
        output::path(file)
    ));
    Ok(())
}

/// Print secrets as `NAME=value` lines or a JSON object.
pub fn get(
    ctx: &Context,
    file: &Path,
    names: &[String],
    unlock: &IdentityArgs,
    json: bool,
) -> Result<()> {
    let identity = ctx.identity(unlock)?;
    let names = (!names.is_empty()).then_some(names);
    let retrieved = ctx.store().get(file, identity.as_ref(), names)?;

    for warning in &retrieved.warnings {
        output::warn(&warning.to_string());
    }

    if json {
        let map: BTreeMap<&str, &str> = retrieved
            .secrets
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let rendered =
            Zeroizing::new(serde_json::to_string_pretty(&map).map_err(std::io::Error::from)?);
        println!("{}", rendered.as_str());
    } else {
        for (name, value) in &retrieved.secrets {
            println!("{}={}", name, value.as_str());
        }
    }
    Ok(())
}

/// Show a store's format and recipients without decrypting it.
pub fn recipients(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let (format, recipients) = ctx.store().recipients(file)?;

    if json {
        let value = serde_json::json!({
            "format": format.to_string(),
            "recipients": recipients,
        });
        println!("{}", value);
        return Ok(());
    }

    output::header(&file.display().to_string());
    output::kv("format:", format);
    if recipients.is_empty() {
        output::kv("recipients:", "none (keys managed by sops)");
    } else {
        output::kv("recipients:", recipients.len());
        for recipient in &recipients {
            output::list_item(&output::key(recipient));
        }
    }
    Ok(())
}

/// Split `NAME=VALUE` arguments at the first `=`.
fn parse_pairs(pairs: &[String]) -> Result<Secrets> {
    let mut secrets = Secrets::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(Error::InvalidSecretName {
                name: pair.clone(),
                reason: "expected NAME=VALUE".to_string(),
            });
        };
        secrets.insert(name.to_string(), Zeroizing::new(value.to_string()));
    }
    Ok(secrets)
}
