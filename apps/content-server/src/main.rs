//! Content server: loads configuration, connects the database, runs
//! migrations and serves the content REST API until interrupted.

mod config;

use anyhow::Result;
use axum::{routing::get, Router};
use clap::Parser;
use config::{AppConfig, LoggingConfig};
use content_service::{infra::storage, ContentServiceModule};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "content-server", version, about = "Content modeling and page layout server")]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, overrides `server.bind_addr`
    #[arg(long)]
    pub bind: Option<String>,

    /// Database URL, overrides `database.url`
    #[arg(long)]
    pub database_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Apply migrations and exit
    #[arg(long)]
    pub migrate_only: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => {},
    }
    tracing::info!("Shutdown requested");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    init_tracing(&config.logging);

    let db = storage::connect(&config.database.url, config.database.max_connections).await?;
    let module = ContentServiceModule::new(config.content.clone());
    module.migrate(&db).await?;
    if cli.migrate_only {
        return Ok(());
    }
    module.init(Arc::new(db)).await?;

    let api = module.register_rest(Router::new())?;
    let app = match config.server.api_prefix() {
        Some(prefix) => Router::new().nest(prefix, api),
        None => Router::new().merge(api),
    };
    let app = app
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "Content server listening");

    let cancel = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    tracing::info!("Content server stopped");
    Ok(())
}
