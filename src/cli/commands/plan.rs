use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::app::planner_from_config;
use crate::cli::OutputFormat;
use crate::config;
use crate::sources::{Params, Source};

#[derive(Args)]
pub struct PlanArgs {
    #[arg(help = "Source name, e.g. fluview")]
    pub source: String,

    #[arg(help = "Request parameters as key=value, e.g. epiweeks=201501-201510")]
    pub params: Vec<String>,
}

pub async fn handle(args: PlanArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let params = parse_pairs(&args.params)?;
    let source = Source::from_name(Some(args.source.as_str()))?;
    let planner = planner_from_config(config::config())?;
    let plan = planner.plan(source, &params)?;

    let statements: Vec<_> = plan.statements.iter().map(|s| s.to_sql()).collect();
    match output_format {
        OutputFormat::Json => {
            let rendered: Vec<_> = statements
                .iter()
                .map(|sql| {
                    json!({
                        "query": sql.query,
                        "params": sql.params.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "source": source.name(), "statements": rendered }))?);
        }
        OutputFormat::Text => {
            for (i, sql) in statements.iter().enumerate() {
                println!("-- statement {} of {}", i + 1, statements.len());
                println!("{};", sql.query);
                for (n, param) in sql.params.iter().enumerate() {
                    println!("--   ${} = {}", n + 1, param);
                }
            }
        }
    }
    Ok(())
}

pub(super) fn parse_pairs(pairs: &[String]) -> anyhow::Result<Params> {
    let parsed = pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .with_context(|| format!("expected key=value, got '{}'", pair))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Params::from_pairs(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let params = parse_pairs(&["epiweeks=201501-201510".to_string(), "regions=nat,hhs1".to_string()]).unwrap();
        assert_eq!(params.get("epiweeks"), Some("201501-201510"));
        assert_eq!(params.get("regions"), Some("nat,hhs1"));
        assert!(parse_pairs(&["epiweeks".to_string()]).is_err());
    }
}
