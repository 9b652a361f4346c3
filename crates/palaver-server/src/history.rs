//! Per-user chat history cache.
//!
//! On a cache miss the full history is rebuilt from the store: direct
//! messages first, then every group message tagged with its group, stably
//! sorted by creation time. The result is cached for a fixed TTL counted from
//! insertion. New messages do **not** invalidate an entry, so a hit can lag
//! behind the store by at most one TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use palaver_shared::protocol::HistoryEntry;
use palaver_shared::types::UserId;
use palaver_store::{GroupThread, Message};

use crate::error::ChatResult;
use crate::store::ChatStore;

// ---------------------------------------------------------------------------
// Cached entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CachedHistory {
    entries: Vec<HistoryEntry>,
    inserted_at: Instant,
}

impl CachedHistory {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct HistoryCache {
    ttl: Duration,
    cache: Arc<RwLock<HashMap<UserId, CachedHistory>>>,
}

impl HistoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The cached history of `user`, or `None` on a miss or an expired entry.
    pub async fn get(&self, user: UserId) -> Option<Vec<HistoryEntry>> {
        let cache = self.cache.read().await;
        cache
            .get(&user)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.entries.clone())
    }

    /// Store `entries` for `user`, replacing any previous entry and
    /// restarting its TTL.
    pub async fn put(&self, user: UserId, entries: Vec<HistoryEntry>) {
        let mut cache = self.cache.write().await;
        cache.insert(
            user,
            CachedHistory {
                entries,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Serve `user`'s history from cache, rebuilding and caching it on a miss.
    pub async fn get_or_load(
        &self,
        store: &dyn ChatStore,
        user: UserId,
    ) -> ChatResult<Vec<HistoryEntry>> {
        if let Some(entries) = self.get(user).await {
            debug!(user = %user, messages = entries.len(), "History served from cache");
            return Ok(entries);
        }

        let entries = load_history(store, user).await?;
        debug!(user = %user, messages = entries.len(), "History rebuilt from store");
        self.put(user, entries.clone()).await;
        Ok(entries)
    }

    /// Evict expired entries.
    pub async fn purge_expired(&self) {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.is_fresh(self.ttl));
        let removed = before - cache.len();
        if removed > 0 {
            debug!(removed, "Purged expired history cache entries");
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Rebuild `user`'s full history from the store.
pub async fn load_history(store: &dyn ChatStore, user: UserId) -> ChatResult<Vec<HistoryEntry>> {
    let direct = store.find_direct_messages_for_user(user).await?;
    let groups = store.find_group_conversations_for_user(user).await?;
    Ok(merge_history(direct, groups))
}

/// Concatenate direct then group messages and stable-sort by `created_at`,
/// so equal timestamps keep direct messages ahead of group ones.
pub fn merge_history(direct: Vec<Message>, groups: Vec<GroupThread>) -> Vec<HistoryEntry> {
    let mut merged: Vec<HistoryEntry> = direct.into_iter().map(HistoryEntry::direct).collect();

    for thread in groups {
        let GroupThread {
            conversation,
            messages,
        } = thread;
        merged.extend(
            messages
                .into_iter()
                .map(|message| HistoryEntry::group(message, &conversation)),
        );
    }

    merged.sort_by_key(HistoryEntry::created_at);
    merged
}
