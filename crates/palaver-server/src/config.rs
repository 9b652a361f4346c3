//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. A `.env` file in the working
//! directory is honoured (loaded in `main`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use palaver_shared::constants::{
    APP_NAME, DEFAULT_HTTP_PORT, HISTORY_CACHE_PURGE_SECS, HISTORY_CACHE_TTL_SECS,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP + WebSocket server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: platform data directory (see `Database::open_default`).
    pub database_path: Option<PathBuf>,

    /// Origin allowed by CORS. `*` allows any origin.
    /// Env: `CORS_ORIGIN`
    /// Default: `http://localhost:3000`
    pub cors_origin: String,

    /// Time-to-live of a cached chat history, measured from insertion.
    /// Env: `HISTORY_CACHE_TTL_SECS`
    /// Default: 3600
    pub history_ttl: Duration,

    /// Interval of the background sweep evicting expired history.
    /// Env: `HISTORY_CACHE_PURGE_SECS`
    /// Default: 600
    pub history_purge_interval: Duration,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Palaver"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            cors_origin: "http://localhost:3000".to_string(),
            history_ttl: Duration::from_secs(HISTORY_CACHE_TTL_SECS),
            history_purge_interval: Duration::from_secs(HISTORY_CACHE_PURGE_SECS),
            instance_name: APP_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        // Bare PORT is accepted too, for hosts that only set that.
        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, ignoring"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            config.cors_origin = origin;
        }

        if let Some(secs) = parse_secs(&lookup, "HISTORY_CACHE_TTL_SECS") {
            config.history_ttl = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "HISTORY_CACHE_PURGE_SECS") {
            if secs.is_zero() {
                tracing::warn!("HISTORY_CACHE_PURGE_SECS must be positive, using default");
            } else {
                config.history_purge_interval = secs;
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}
