//! # palaver-server
//!
//! Real-time chat backend.
//!
//! This binary provides:
//! - **WebSocket endpoint** (`/ws`) speaking a JSON event protocol for
//!   presence, direct and group messaging, and group management
//! - **Chat history cache** so a reconnecting user gets their merged history
//!   without rebuilding it from storage every time
//! - **SQLite persistence** for users, conversations and messages
//! - **REST endpoints** (axum) for user registration and listing, a user's
//!   groups, health checks and instance info

mod api;
mod config;
mod dispatch;
mod error;
mod groups;
mod history;
mod registry;
mod session;
mod store;
mod ws;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use palaver_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::history::HistoryCache;
use crate::session::SessionCoordinator;
use crate::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Load a `.env` file from the working directory, if present
    // -----------------------------------------------------------------------
    dotenvy::dotenv().ok();

    // -----------------------------------------------------------------------
    // 2. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,palaver_server=debug")),
        )
        .init();

    info!("Starting Palaver chat server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 3. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 4. Open storage and build the chat core
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::open_default()?,
    };
    info!(path = ?db.path(), "Database ready");

    let store = Arc::new(SqliteStore::new(db));
    let history = HistoryCache::new(config.history_ttl);
    let coordinator = Arc::new(SessionCoordinator::new(
        store.clone(),
        store.clone(),
        history.clone(),
    ));

    let app_state = AppState {
        coordinator,
        store,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic history cache cleanup
    let purge_every = config.history_purge_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            history.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 6. Run the HTTP + WebSocket server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
