//! `tami`: keep a virtual pet alive from your terminal.

mod app;
mod commands;
mod status;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tami_core::TamiConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "tami.toml", env = "TAMI_CONFIG")]
    config: PathBuf,

    /// Path to the pet database (overrides `persistence.path`)
    #[arg(short, long, env = "TAMI_DB")]
    db: Option<String>,

    /// Fixed RNG seed for reproducible decay (overrides `driver.seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Log level when `RUST_LOG` is unset (overrides `general.log_level`)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = TamiConfig::from_file_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(db) = args.db {
        config.persistence.path = db;
    }
    if args.seed.is_some() {
        config.driver.seed = args.seed;
    }

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .context("invalid log level")?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        config = %args.config.display(),
        db = %config.persistence.path,
        seeded = config.driver.seed.is_some(),
        "Starting Tami"
    );

    app::run(config).await
}
