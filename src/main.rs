use leetbot::AppState;
use leetbot::config::{self, Config};
use leetbot::db;
use leetbot::discord::Handler;

use anyhow::Context as _;
use clap::Parser;
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "LeetBot - LeetCode practice companion for Discord", long_about = None)]
struct Cli {
    /// Config file path (default: ~/.leetbot/leetbot.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!(
        r#"
    __    ___________________   ____  ______
   / /   / ____/ ____/_  __/  _/ __ )/ ____/
  / /   / __/ / __/   / /    / / __  / /
 / /___/ /___/ /___  / /   _/ / /_/ / /___
/_____/_____/_____/ /_/   /___/_____/\____/
    "#
    );

    let args = Cli::parse();
    let config_path = config::resolve_config_path(args.config);

    if !config_path.exists() {
        Config::write_placeholder(&config_path)?;
        println!("First run: wrote a config template to {config_path:?}.");
        println!("Fill in your Discord bot token and start leetbot again.");
        return Ok(());
    }

    let config = Config::load(&config_path)?;
    if config.has_placeholders() {
        anyhow::bail!(
            "config at {config_path:?} still contains placeholder values, fill in your Discord bot token"
        );
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "leetbot=info,serenity=warn".to_string()),
        )
        .init();
    info!("configuration loaded from {config_path:?}");

    let pool = db::connect(&config.database.url)
        .await
        .context("Failed to open the problem database")?;
    db::init_schema(&pool).await?;

    let state = Arc::new(AppState::new(config.clone(), pool));
    state.registry.init_cache().await?;
    info!(
        "problem cache holds {} problems",
        state.problems.cached_count().await?
    );

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(Handler { state })
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client exited")?;
    Ok(())
}
