//! quake-api - read-only bulletin query service
//!
//! Serves earthquake and tsunami bulletins, record history and the
//! human-readable timeline from an SQLite document log, or from a JSON-lines
//! fixture when `--fixture` is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use quake_api::store::{EventStore, MemoryStore, SqliteStore};
use quake_api::{build_router, AppState};
use quake_common::config::{default_config_path, ConfigOverrides, ServiceConfig, TomlConfig};

/// Command-line arguments for quake-api
#[derive(Parser, Debug)]
#[command(name = "quake-api")]
#[command(about = "Read-only query service for earthquake and tsunami bulletins")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "QUAKE_API_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding the bulletin log
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Per-query store timeout in seconds
    #[arg(long)]
    query_timeout: Option<u64>,

    /// Default log directive when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Serve documents from a JSON-lines file instead of the database
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let (toml_config, config_source) = TomlConfig::load_optional(config_path.clone())
        .with_context(|| match &config_path {
            Some(path) => format!("Failed to load config {}", path.display()),
            None => "Failed to load config".to_string(),
        })?;

    let config = ServiceConfig::resolve(
        ConfigOverrides {
            database_path: args.database,
            bind_address: args.bind,
            query_timeout_secs: args.query_timeout,
            log_level: args.log_level,
        },
        toml_config,
    )
    .context("Invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .init();
    config_source.log();

    info!(
        "Starting quake-api v{} (bind {}, query timeout {:?})",
        env!("CARGO_PKG_VERSION"),
        config.bind_address,
        config.query_timeout
    );

    let store: Arc<dyn EventStore> = match args.fixture {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read fixture {}", path.display()))?;
            let store = MemoryStore::from_json_lines(&content)
                .with_context(|| format!("Malformed fixture {}", path.display()))?;
            info!("Serving {} documents from fixture {}", store.len(), path.display());
            Arc::new(store)
        }
        None => {
            info!("Database path: {}", config.database_path.display());
            match SqliteStore::connect_readonly(&config.database_path).await {
                Ok(store) => {
                    info!("Connected to database (read-only)");
                    Arc::new(store)
                }
                Err(e) => {
                    error!("Failed to connect to database: {}", e);
                    return Err(e);
                }
            }
        }
    };

    let app = build_router(AppState::new(store, config.query_timeout));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("quake-api listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
