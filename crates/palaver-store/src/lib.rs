//! # palaver-store
//!
//! SQLite persistence for Palaver: users, conversations and messages.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection`, with typed helpers for every entity. List-valued
//! conversation fields (participants, admins, message ids) are stored as JSON
//! columns so that a conversation row is always read and written whole.

pub mod conversations;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
