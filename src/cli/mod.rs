pub mod seed;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Mission Control seeder - load or clear fixture data")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Database URL override (defaults to DATABASE_URL)")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Import users, missions, incidents and reports from fixture files")]
    Import {
        #[arg(long, help = "Directory holding users/missions/incidents/reports .json or .yaml files", default_value = "data")]
        dir: PathBuf,
    },

    #[command(about = "Delete every report, incident, mission and user")]
    Destroy,
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

    let mut database = crate::config::config().database.clone();
    if let Some(url) = cli.database_url {
        database.url = url;
    }
    let db = crate::database::Database::connect(&database).await?;
    db.migrate().await?;

    let result = match cli.command {
        Commands::Import { dir } => seed::import(&db, &dir, output_format).await,
        Commands::Destroy => seed::destroy(&db, output_format).await,
    };

    db.close().await;
    result
}
