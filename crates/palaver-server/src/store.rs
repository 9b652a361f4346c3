//! Interfaces the chat core consumes from the persistence and identity
//! services, and their SQLite-backed implementation.
//!
//! Every call is a suspension point: handlers await these and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use palaver_shared::types::{ConversationId, MessageId, UserId};
use palaver_store::{
    Conversation, ConversationFilter, ConversationUpdate, Database, GroupThread, Message,
    NewConversation, NewMessage, StoreError, User,
};

/// Durable storage for conversations and messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Users whose ids are listed; unknown ids are skipped, repeats collapse.
    async fn find_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

    async fn find_conversation(
        &self,
        filter: ConversationFilter,
    ) -> Result<Option<Conversation>, StoreError>;

    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation, StoreError>;

    async fn update_conversation(
        &self,
        id: ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation, StoreError>;

    async fn create_message(&self, new: NewMessage) -> Result<Message, StoreError>;

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Direct messages sent or received by `user`, oldest first.
    async fn find_direct_messages_for_user(&self, user: UserId)
        -> Result<Vec<Message>, StoreError>;

    /// Groups `user` participates in, each with its messages oldest first.
    async fn find_group_conversations_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<GroupThread>, StoreError>;
}

/// Resolves user ids to display names.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve_username(&self, user: UserId) -> Result<Option<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// SQLite adapter
// ---------------------------------------------------------------------------

/// [`ChatStore`] and [`IdentityService`] over a shared [`Database`].
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Direct access to the database, for provisioning users.
    pub async fn database(&self) -> tokio::sync::MutexGuard<'_, Database> {
        self.db.lock().await
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn find_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        self.db.lock().await.get_users_by_ids(ids)
    }

    async fn find_conversation(
        &self,
        filter: ConversationFilter,
    ) -> Result<Option<Conversation>, StoreError> {
        self.db.lock().await.find_conversation(&filter)
    }

    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation, StoreError> {
        self.db.lock().await.insert_conversation(&new)
    }

    async fn update_conversation(
        &self,
        id: ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation, StoreError> {
        self.db.lock().await.update_conversation(id, &update)
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        self.db.lock().await.insert_message(&new)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        self.db.lock().await.find_message(id)
    }

    async fn find_direct_messages_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Message>, StoreError> {
        self.db.lock().await.get_direct_messages_for_user(user)
    }

    async fn find_group_conversations_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<GroupThread>, StoreError> {
        self.db.lock().await.get_group_threads_for_user(user)
    }
}

#[async_trait]
impl IdentityService for SqliteStore {
    async fn resolve_username(&self, user: UserId) -> Result<Option<String>, StoreError> {
        match self.db.lock().await.get_user(user) {
            Ok(found) => Ok(Some(found.username)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// In-memory store seeded with the given usernames.
    pub async fn seeded(usernames: &[&str]) -> (Arc<SqliteStore>, Vec<User>) {
        let store = SqliteStore::new(Database::open_in_memory().unwrap());
        let mut users = Vec::new();
        {
            let db = store.database().await;
            for name in usernames {
                users.push(db.create_user(name).unwrap());
            }
        }
        (Arc::new(store), users)
    }
}
