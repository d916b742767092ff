//! songdeck - song catalog service
//!
//! REST API with live change notifications over SSE.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use songdeck::config::{Cli, Config};
use songdeck::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting songdeck v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::resolve(Cli::parse());
    info!("Data directory: {}", config.data_dir.display());

    let pool = db::init_database(&config.database_path()).await?;
    info!("✓ Connected to database");

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("songdeck listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
