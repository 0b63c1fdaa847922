//! ury-schedule - read-only schedule service for the URY website
//!
//! Resolves its root folder (CLI > environment > TOML > platform default),
//! opens or creates the database there and serves the JSON API.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use ury_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use ury_common::db::init::init_database;
use ury_schedule::{build_router, AppState};

const MODULE_NAME: &str = "ury-schedule";

/// Command-line arguments for ury-schedule
#[derive(Parser, Debug)]
#[command(name = "ury-schedule")]
#[command(about = "Schedule, metadata and programme guide service for URY")]
#[command(version)]
struct Args {
    /// Folder holding urysite.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to bind (overrides [server] bind_address)
    #[arg(short, long, env = "URYSITE_SCHEDULE_BIND")]
    bind: Option<String>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "URYSITE_SCHEDULE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_for_module(MODULE_NAME);

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("ury_schedule={0},ury_common={0},tower_http=info", config.logging.level)
                        .into()
                }),
        )
        .init();

    info!(
        "Starting URY schedule service v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    if config.schedule.require_approval {
        info!("Only approved metadata is served");
    }

    let bind = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let app = build_router(AppState::new(pool, config.schedule));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("ury-schedule listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
