pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::database::{DatabaseManager, PgStore};

#[derive(Parser)]
#[command(name = "hyfen")]
#[command(about = "Hyfen CLI - operator tasks for the Hyfen API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Install the default subscription plans (idempotent)")]
    InitPlans,

    #[command(about = "Show which property a host name resolves to")]
    Resolve {
        #[arg(help = "Host name, optionally with a port")]
        host: String,
    },

    #[command(about = "Print the slug a property or tenant name would get")]
    Slugify {
        #[arg(help = "Display name")]
        name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// Connects to the configured database without running migrations.
async fn connect_store() -> anyhow::Result<PgStore> {
    let pool = DatabaseManager::connect(&config::config().database).await?;
    Ok(PgStore::new(pool))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::InitPlans => commands::plans::handle(output_format).await,
        Commands::Resolve { host } => commands::resolve::handle(host, output_format).await,
        Commands::Slugify { name } => commands::slugify::handle(name, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["hyfen", "--json", "resolve", "pousada.com.br:8080"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Resolve { ref host } if host == "pousada.com.br:8080"));

        let cli = Cli::try_parse_from(["hyfen", "init-plans"]).unwrap();
        assert!(matches!(cli.command, Commands::InitPlans));
    }
}
