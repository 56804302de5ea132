//! Dockscreen - virtual screening of CDK2 inhibitor candidates.
//! Entry point for the command-line binary.

mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dockscreen=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    info!("Dockscreen {}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };
    info!(
        vina = %config.docking.vina_path.display(),
        work_dir = %config.docking.work_dir.display(),
        admet = %config.admet.api_url,
        "Configuration loaded"
    );

    let app = commands::App::build(&config).await?;
    let recovered = app.docking.recover_interrupted().await?;
    if !recovered.is_empty() {
        warn!("{} interrupted docking jobs marked FAILED", recovered.len());
    }

    app.run(cli.command).await
}
