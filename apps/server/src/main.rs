//! # SmartPOS Server
//!
//! HTTP API over the sale engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SmartPOS Server                                  │
//! │                                                                         │
//! │  Till / back office ───► HTTP (8080) ───► SaleService ───► SQLite      │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                        JWT (identity provider)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use smartpos_db::{Database, DbConfig};
use smartpos_server::config::ServerConfig;
use smartpos_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,smartpos=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting SmartPOS server...");

    let config = ServerConfig::load(None).context("Failed to load configuration")?;
    let addr = config.server.bind_address();
    info!(
        %addr,
        db_path = %config.database.path.display(),
        allow_negative_stock = config.sales.allow_negative_stock,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(config.database.path.clone())
            .max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to open database")?;

    let app = router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
