//! # palaver-shared
//!
//! Types shared by every Palaver crate: typed identifiers, the domain
//! entities (users, conversations, messages) and the JSON event protocol
//! spoken over the real-time connection.

pub mod constants;
pub mod models;
pub mod protocol;
pub mod types;
