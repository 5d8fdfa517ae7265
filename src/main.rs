//! # Activities API Main Entry Point
//!
//! This is the main entry point for the Mergington Activities API service.

use std::path::PathBuf;

use activities::{
    config::ConfigLoader,
    db::init_pool,
    server::{initialize, run_server},
    telemetry::init_tracing,
};
use clap::Parser;

/// Command-line overrides applied on top of the layered environment config
#[derive(Debug, Parser)]
#[command(name = "activities", version, about = "Mergington High School activities API")]
struct Cli {
    /// Directory holding the `.env*` files
    #[arg(long, value_name = "DIR")]
    env_dir: Option<PathBuf>,

    /// Database URL (overrides MERGINGTON_DATABASE_URL)
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Socket address to listen on (overrides MERGINGTON_API_BIND_ADDR)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Do not insert the initial activity catalog into an empty store
    #[arg(long)]
    skip_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_loader = match cli.env_dir {
        Some(dir) => ConfigLoader::with_base_dir(dir),
        None => ConfigLoader::new(),
    };
    let mut config = config_loader.load()?;

    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(bind) = cli.bind {
        config.api_bind_addr = bind;
    }
    if cli.skip_seed {
        config.seed_on_startup = false;
    }
    config.validate()?;

    init_tracing(&config)?;
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    let db = init_pool(&config).await?;
    initialize(&config, &db).await?;

    run_server(config, db).await
}
