//! Schema versioning through `PRAGMA user_version`.

pub mod v001_initial;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

type Migration = fn(&Connection) -> rusqlite::Result<()>;

/// Migrations in order; entry `i` brings the schema to version `i + 1`.
const MIGRATIONS: &[(&str, Migration)] = &[("v001_initial", v001_initial::up)];

/// Bring the schema up to date. Already applied steps are skipped.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: usize = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    debug!(applied, latest = MIGRATIONS.len(), "Checking chat schema");

    for (index, (name, up)) in MIGRATIONS.iter().enumerate().skip(applied) {
        info!(migration = name, "Applying chat schema migration");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", index + 1)?;
    }

    Ok(())
}
