/// Application name
pub const APP_NAME: &str = "Palaver";

/// Default HTTP / WebSocket port
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Path of the WebSocket endpoint
pub const WS_PATH: &str = "/ws";

/// How long a user's merged chat history stays cached (1 hour)
pub const HISTORY_CACHE_TTL_SECS: u64 = 3600;

/// How often expired history entries are evicted (10 minutes)
pub const HISTORY_CACHE_PURGE_SECS: u64 = 600;

/// Minimum number of invitees (besides the admin) when creating a group
pub const MIN_GROUP_INVITEES: usize = 1;
