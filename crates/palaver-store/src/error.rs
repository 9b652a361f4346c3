use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No platform data directory to place the default database in.
    #[error("No data directory available for the chat database")]
    NoDataDir,

    #[error("Creating database directory: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup by id matched no row.
    #[error("No such record")]
    NotFound,

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Stored id is not a UUID: {0}")]
    Uuid(#[from] uuid::Error),

    /// A participants, admins, messages or seen-by column held bad JSON.
    #[error("List column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored timestamp is not RFC 3339: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
