//! Live connection tracking.
//!
//! Maps each identified connection to the user behind it. A user may hold
//! several connections at once (one per device or tab). State is in-memory
//! only and vanishes on restart.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use palaver_shared::protocol::ActiveUser;
use palaver_shared::types::{ConnectionId, UserId};

/// Who is behind an identified connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: UserId,
    pub username: String,
    /// Registration order, used to keep the presence list stable.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<ConnectionId, Presence>,
    next_seq: u64,
}

/// Registry of identified connections, shared by every connection task.
///
/// The lock is only ever held for in-memory work, never across a store call.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `connection` to a user and return the updated presence list.
    pub async fn register(
        &self,
        connection: ConnectionId,
        user_id: UserId,
        username: String,
    ) -> Vec<ActiveUser> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            connection,
            Presence {
                user_id,
                username,
                seq,
            },
        );

        debug!(
            connection = %connection,
            user = %user_id,
            connections = inner.entries.len(),
            "Registered connection"
        );

        active_users(&inner.entries)
    }

    /// Drop `connection` if present and return the updated presence list.
    pub async fn unregister(&self, connection: ConnectionId) -> Vec<ActiveUser> {
        let mut inner = self.inner.write().await;
        if let Some(presence) = inner.entries.remove(&connection) {
            debug!(
                connection = %connection,
                user = %presence.user_id,
                connections = inner.entries.len(),
                "Unregistered connection"
            );
        }
        active_users(&inner.entries)
    }

    /// The user behind `connection`, if it has joined.
    pub async fn identity(&self, connection: ConnectionId) -> Option<Presence> {
        self.inner.read().await.entries.get(&connection).cloned()
    }

    /// Every live connection of `user`, oldest first. Empty when offline.
    pub async fn connections_for(&self, user: UserId) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        let mut found: Vec<(u64, ConnectionId)> = inner
            .entries
            .iter()
            .filter(|(_, presence)| presence.user_id == user)
            .map(|(connection, presence)| (presence.seq, *connection))
            .collect();
        found.sort_unstable_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, connection)| connection).collect()
    }

    /// Distinct online users in first-registration order.
    pub async fn active_users(&self) -> Vec<ActiveUser> {
        active_users(&self.inner.read().await.entries)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

fn active_users(entries: &HashMap<ConnectionId, Presence>) -> Vec<ActiveUser> {
    let mut ordered: Vec<&Presence> = entries.values().collect();
    ordered.sort_unstable_by_key(|presence| presence.seq);

    let mut users: Vec<ActiveUser> = Vec::with_capacity(ordered.len());
    for presence in ordered {
        if users.iter().any(|u| u.user_id == presence.user_id) {
            continue;
        }
        users.push(ActiveUser {
            user_id: presence.user_id,
            username: presence.username.clone(),
        });
    }
    users
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        let alice = UserId::new();

        let users = registry.register(conn, alice, "alice".into()).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");

        assert_eq!(registry.connections_for(alice).await, vec![conn]);
        assert_eq!(registry.identity(conn).await.map(|p| p.user_id), Some(alice));
    }

    #[tokio::test]
    async fn test_multi_device_is_deduplicated() {
        let registry = ConnectionRegistry::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let phone = ConnectionId::new();
        let laptop = ConnectionId::new();

        registry.register(phone, alice, "alice".into()).await;
        registry.register(ConnectionId::new(), bob, "bob".into()).await;
        let users = registry.register(laptop, alice, "alice".into()).await;

        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(registry.connections_for(alice).await, vec![phone, laptop]);

        // Alice stays online while one device remains.
        registry.unregister(phone).await;
        assert_eq!(registry.connections_for(alice).await, vec![laptop]);
        assert_eq!(registry.active_users().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        registry.register(conn, UserId::new(), "carol".into()).await;

        assert!(registry.unregister(conn).await.is_empty());
        assert!(registry.unregister(conn).await.is_empty());
        assert!(registry.unregister(ConnectionId::new()).await.is_empty());
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_connections() {
        let registry = ConnectionRegistry::new();
        assert!(registry.connections_for(UserId::new()).await.is_empty());
        assert!(registry.identity(ConnectionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_presence_after_joins_and_disconnects() {
        let registry = ConnectionRegistry::new();
        let users: Vec<UserId> = (0..4).map(|_| UserId::new()).collect();
        let mut connections = Vec::new();

        // Five joins across four users, one of them twice.
        for (i, user) in users.iter().chain(std::iter::once(&users[0])).enumerate() {
            let conn = ConnectionId::new();
            registry.register(conn, *user, format!("user{i}")).await;
            connections.push(conn);
        }

        // Disconnect user 1 and one of user 0's two connections.
        registry.unregister(connections[1]).await;
        registry.unregister(connections[0]).await;

        let online: Vec<UserId> = registry.active_users().await.iter().map(|u| u.user_id).collect();
        assert_eq!(online.len(), 3);
        assert!(online.contains(&users[0]));
        assert!(!online.contains(&users[1]));
    }
}
