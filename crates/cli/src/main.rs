//! fleet-inspect CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins in init_logging; otherwise --log-level, then general.log_level
    let log_level = cli.log_level.clone().unwrap_or_else(|| {
        config::AppConfig::load(cli.config.as_deref())
            .map(|c| c.general.log_level)
            .unwrap_or_else(|_| "info".to_string())
    });
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Fingerprint(args) => commands::fingerprint::execute(args, cli.config).await,
        Commands::Fatigue(args) => commands::fatigue::execute(args).await,
        Commands::Categorize(args) => commands::categorize::execute(args).await,
        Commands::Ingest(args) => commands::ingest::execute(args, cli.config).await,
        Commands::Search(args) => commands::search::execute(args, cli.config).await,
        Commands::Recent(args) => commands::search::recent(args, cli.config).await,
        Commands::Stats(args) => commands::stats::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args, cli.config).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
