use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use waypost::config::{Cli, Config};
use waypost::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_cli(&cli)?;
    let context = Arc::new(cfg.load_context()?);

    tokio::select! {
        res = server::listener::run(&cfg.server, context) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
