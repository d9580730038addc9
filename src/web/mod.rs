//! murmur-web: the HTTP surface.
//!
//! Parses configuration, opens the SQLite database, wires the JWT service
//! and the GitHub identity provider into the shared state, and serves the
//! REST API until Ctrl+C or SIGTERM.

pub mod config;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};

use crate::auth::{GithubProvider, JwtService};
use crate::storage::{Storage, StorageError};

use config::{Cli, Config, ConfigError};
use state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open database: {0}")]
    Storage(#[from] StorageError),

    #[error("server i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Entry point: parse CLI, open storage, start server.
pub async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();
    crate::logging::init();

    let config = Config::from_cli_and_env(cli)?;

    info!("murmur starting");
    info!("  database: {}", config.database.display());
    info!("  client origin: {}", config.client_origin);
    info!("  oauth callback: {}", config.github_callback_url);

    let storage = Storage::open(&config.database)?;
    let provider = GithubProvider::new(
        config.github_client_id.clone(),
        config.github_client_secret.clone(),
        config.github_callback_url.clone(),
    );
    let state = AppState::new(
        storage,
        JwtService::new(&config.jwt_secret),
        Arc::new(provider),
        config.client_origin.clone(),
    )
    .shared();

    let app = router::build_router(state, &config.client_origin);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("murmur listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("murmur stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
