use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use shelfdb::cli::Cli;
use shelfdb::{Config, LogConfig, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    let result = match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.into();
    }

    init_tracing(&config.log)?;
    info!("Starting ShelfDB {}", env!("CARGO_PKG_VERSION"));

    let command = cli.command()?;
    let store = Store::open(&config)
        .await
        .with_context(|| format!("failed to open database '{}'", config.db_path.display()))?;

    let response = command.execute(&store).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
