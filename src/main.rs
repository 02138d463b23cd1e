//! Chess Play - unified CLI.

use anyhow::Result;
use chess_play::{AppConfig, Cli, Command, ServerConfig, run_tui};
use chess_play_server::{GameStore, router};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli
        .command
        .apply_to(AppConfig::load_or_default(&cli.config)?.with_env()?);

    match cli.command {
        Command::Play { .. } => run_tui(config).await,
        Command::Serve { .. } => run_server(config.server()).await,
    }
}

/// Runs the archive REST server.
async fn run_server(server: &ServerConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = GameStore::new();
    let app = router(store);

    let listener = tokio::net::TcpListener::bind((server.host().as_str(), *server.port())).await?;
    info!(
        host = %server.host(),
        port = server.port(),
        "Archive server ready at http://{}:{}/",
        server.host(),
        server.port()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
