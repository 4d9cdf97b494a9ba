use anyhow::{Context, Result};
use clap::Parser;
use leetbot::config::{self, Config};
use leetbot::db;
use std::path::PathBuf;

/// One-off migration for databases created before the premium flag existed.
#[derive(Parser)]
#[command(name = "patchdb")]
#[command(about = "Add the premium column to an existing problems table", long_about = None)]
struct Cli {
    /// Config file path (default: ~/.leetbot/leetbot.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config::resolve_config_path(cli.config);
    let config = Config::load(&config_path)?;

    let pool = db::connect(&config.database.url)
        .await
        .context("Failed to open the problem database")?;

    sqlx::query("ALTER TABLE problems ADD COLUMN premium BOOLEAN NOT NULL DEFAULT 0")
        .execute(&pool)
        .await
        .context("Failed to add the premium column (already migrated?)")?;

    println!("Migration successful: added 'premium' column.");
    Ok(())
}
