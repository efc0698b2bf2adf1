use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::{self, AppState};
use crate::auth::{FirebaseVerifier, SiteAdmins};
use crate::config;
use crate::database::{schema, DatabaseManager, PgStore};

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    info!("Starting Starter API in {:?} mode", config.environment);

    let verifier = FirebaseVerifier::from_config(&config.auth)
        .context("failed to configure identity verification")?;

    DatabaseManager::init(&config.database)
        .await
        .context("failed to initialize database pool")?;
    let pool = DatabaseManager::pool().await?;
    schema::ensure_schema(&pool)
        .await
        .context("failed to initialize database schema")?;

    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(verifier),
        SiteAdmins::new(&config.auth.site_admin_emails),
    );
    let app = app::router(state, &config.security);

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server.port)));
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Starter API running on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
