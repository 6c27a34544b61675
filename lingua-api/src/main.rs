//! lingua-api — main entry point
//!
//! Boots the learning backend: configuration, database schema and
//! catalog seeding, external service clients, the agent orchestrator,
//! and the HTTP/WebSocket server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lingua_api::agents::{AgentContext, Orchestrator};
use lingua_api::api;
use lingua_api::content::seed_catalogs;
use lingua_api::services::{OpenAiClient, SpeechClient};
use lingua_common::config::{default_database_path, load_settings};
use lingua_common::db::init::init_database;

/// Command-line arguments for lingua-api
#[derive(Parser, Debug)]
#[command(name = "lingua-api")]
#[command(about = "English-learning backend service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "LINGUA_API_PORT")]
    port: u16,

    /// SQLite database file (defaults to the per-user data directory)
    #[arg(short, long, env = "LINGUA_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Config file (defaults to the per-user config directory)
    #[arg(short, long, env = "LINGUA_CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingua_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting lingua-api on port {}", args.port);

    let settings = Arc::new(
        load_settings(args.config.as_deref()).context("Failed to load configuration")?,
    );

    let db_path = args.database.unwrap_or_else(default_database_path);
    info!("Database: {}", db_path.display());
    let db = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    seed_catalogs(&db).await.context("Failed to seed content catalogs")?;

    let llm = Arc::new(
        OpenAiClient::new(settings.openai.clone()).context("Failed to build the LLM client")?,
    );
    let speech = Arc::new(
        SpeechClient::new(settings.speech.clone()).context("Failed to build the speech client")?,
    );
    if !llm.is_configured() {
        tracing::warn!("Azure OpenAI is not configured; exercises fall back to built-in content");
    }
    if !speech.is_configured() {
        tracing::warn!("Azure Speech is not configured; audio features are unavailable");
    }

    let orchestrator = Arc::new(Orchestrator::new(AgentContext {
        db: db.clone(),
        llm,
        speech: speech.clone(),
        settings: settings.clone(),
    }));

    let app_state = api::AppState::new(db, orchestrator, speech, settings, args.port);
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
