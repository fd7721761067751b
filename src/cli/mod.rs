pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "epidata")]
#[command(about = "Epidata CLI - query a server, inspect query plans and sensor authorization")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the SQL a request would run, without touching the database")]
    Plan(commands::plan::PlanArgs),

    #[command(about = "Run a request against a running server")]
    Query(commands::query::QueryArgs),

    #[command(about = "Check sensor names and a credential against the configured registry")]
    Authorize(commands::authorize::AuthorizeArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Plan(args) => commands::plan::handle(args, output_format).await,
        Commands::Query(args) => commands::query::handle(args, output_format).await,
        Commands::Authorize(args) => commands::authorize::handle(args, output_format).await,
    }
}
