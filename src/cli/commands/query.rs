use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::OutputFormat;

use super::plan::parse_pairs;

#[derive(Args)]
pub struct QueryArgs {
    #[arg(long, default_value = "http://localhost:3000", help = "Base URL of a running server")]
    pub url: String,

    #[arg(help = "Source name, e.g. fluview")]
    pub source: String,

    #[arg(help = "Request parameters as key=value")]
    pub params: Vec<String>,
}

pub async fn handle(args: QueryArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    parse_pairs(&args.params)?;
    let mut query = vec![("source".to_string(), args.source.clone())];
    query.extend(
        args.params
            .iter()
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.to_string())),
    );

    let client = reqwest::Client::new();
    let url = format!("{}/api/epidata", args.url.trim_end_matches('/'));
    let body: Value = client
        .get(&url)
        .query(&query)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?
        .json()
        .await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
        OutputFormat::Text => {
            let result = body.get("result").and_then(Value::as_i64).unwrap_or_default();
            let message = body.get("message").and_then(Value::as_str).unwrap_or_default();
            println!("result {}: {}", result, message);
            if let Some(rows) = body.get("epidata").and_then(Value::as_array) {
                for row in rows {
                    println!("{}", row);
                }
            }
        }
    }
    Ok(())
}
