//! Bistro server entry point.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bistro_db::{Database, DbConfig};
use bistro_server::app::build_app;
use bistro_server::config::ServerConfig;
use bistro_server::state::{ensure_bootstrap_admin, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Bistro server...");

    let config = ServerConfig::load()?;
    info!(
        port = config.port,
        db_path = %config.database_path,
        "Configuration loaded"
    );

    // Connecting runs the embedded migrations.
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    ensure_bootstrap_admin(
        &db,
        &config.bootstrap_admin_username,
        &config.bootstrap_admin_password,
    )
    .await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(db, config));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
