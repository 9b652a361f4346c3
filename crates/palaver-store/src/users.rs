//! Read helpers for [`User`] records, plus the insert used by provisioning.

use palaver_shared::types::UserId;
use rusqlite::params;

use crate::database::{format_timestamp, not_found, now, parse_timestamp, parse_uuid, Database};
use crate::error::Result;
use crate::models::User;

impl Database {
    /// Insert a user record as given.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
            params![
                user.id.to_string(),
                user.username,
                format_timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Create a user with a fresh id.
    pub fn create_user(&self, username: &str) -> Result<User> {
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            created_at: now(),
        };
        self.insert_user(&user)?;
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch every user whose id is listed. Unknown ids are skipped and
    /// repeated ids yield a single row, so callers can compare lengths to
    /// detect invalid input. The ids are bound as one JSON array.
    pub fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn().prepare(
            "SELECT id, username, created_at FROM users
             WHERE id IN (SELECT value FROM json_each(?1))
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![serde_json::to_string(ids)?], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Every registered user, oldest first.
    pub fn get_all_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, created_at FROM users ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let username: String = row.get(1)?;
    let created_at: String = row.get(2)?;

    Ok(User {
        id: UserId(parse_uuid(0, &id)?),
        username,
        created_at: parse_timestamp(2, &created_at)?,
    })
}
