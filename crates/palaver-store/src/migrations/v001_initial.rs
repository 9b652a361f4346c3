//! v001 -- Initial schema creation.
//!
//! Creates `users`, `conversations` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (provisioned by the account service)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    username   TEXT NOT NULL,
    created_at TEXT NOT NULL                  -- RFC-3339, microseconds, UTC
);

-- ----------------------------------------------------------------
-- Conversations (direct and group)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversations (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    is_group_chat INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    group_name    TEXT,
    group_photo   TEXT,
    participants  TEXT NOT NULL,              -- JSON array of user ids, ordered
    group_admin   TEXT NOT NULL,              -- JSON array of user ids
    messages      TEXT NOT NULL,              -- JSON array of message ids, append-only
    pair_key      TEXT,                       -- "<low>:<high>" for direct chats only
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_conversations_pair
    ON conversations(pair_key) WHERE pair_key IS NOT NULL;

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    sender_id     TEXT NOT NULL,
    receiver_kind TEXT NOT NULL,              -- 'direct' | 'group'
    receiver_id   TEXT NOT NULL,              -- user id or conversation id
    content       TEXT NOT NULL DEFAULT '',
    media         TEXT,
    reply_to      TEXT,
    seen_by       TEXT NOT NULL,              -- JSON array of user ids
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, created_at);
CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id, created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
