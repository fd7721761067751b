use clap::Args;
use serde_json::{json, Value};

use crate::auth::{AuthError, CredentialPresentation, SecretsFile};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct AuthorizeArgs {
    #[arg(long, help = "Comma-separated sensor names")]
    pub names: String,

    #[arg(long, help = "Credential to present")]
    pub auth: Option<String>,
}

pub async fn handle(args: AuthorizeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let secrets = match &config.files.secrets_file {
        Some(path) => SecretsFile::from_file(path)?,
        None => SecretsFile::default(),
    };
    let (registry, _) = secrets.into_registries(config.auth.clone());

    let names: Vec<&str> = args.names.split(',').map(str::trim).filter(|n| !n.is_empty()).collect();
    let presentation = CredentialPresentation::new(names, args.auth.as_deref());

    let granted = registry.authorize(&presentation);
    if let OutputFormat::Json = output_format {
        println!("{}", serde_json::to_string_pretty(&authorization_report(&granted))?);
    }
    let granted = granted?;
    if let OutputFormat::Text = output_format {
        println!("✓ authorized: {}", granted.join(","));
    }
    Ok(())
}

fn authorization_report(granted: &Result<Vec<String>, AuthError>) -> Value {
    match granted {
        Ok(sensors) => json!({ "authorized": true, "sensors": sensors }),
        Err(e) => json!({ "authorized": false, "error": e.to_string() }),
    }
}
