//! Group lifecycle: creation and membership changes.
//!
//! Participant lists are appended as given, so a caller that adds the same
//! user twice ends up with a repeated id. Removal drops every occurrence.

use std::sync::Arc;

use tracing::{info, warn};

use palaver_shared::constants::MIN_GROUP_INVITEES;
use palaver_shared::types::{ConversationId, UserId};
use palaver_store::{Conversation, ConversationFilter, ConversationUpdate, NewConversation};

use crate::error::{ChatError, ChatResult};
use crate::store::ChatStore;

#[derive(Clone)]
pub struct GroupManager {
    store: Arc<dyn ChatStore>,
}

impl GroupManager {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Create a group administered by `admin`.
    ///
    /// The stored participant list is `admin` followed by `invitees` in the
    /// given order. Every invitee must be a known user; a repeated invitee
    /// counts as invalid.
    pub async fn create_group(
        &self,
        admin: UserId,
        name: String,
        invitees: Vec<UserId>,
        photo: Option<String>,
    ) -> ChatResult<Conversation> {
        if invitees.len() < MIN_GROUP_INVITEES {
            return Err(ChatError::TooFewParticipants {
                min: MIN_GROUP_INVITEES,
            });
        }
        self.ensure_users_exist(&invitees).await?;

        let mut participants = Vec::with_capacity(invitees.len() + 1);
        participants.push(admin);
        participants.extend(invitees);

        let group = self
            .store
            .create_conversation(NewConversation::Group {
                name,
                admin,
                participants,
                photo,
            })
            .await?;

        info!(
            group = %group.id,
            admin = %admin,
            members = group.participants.len(),
            "Group created"
        );
        Ok(group)
    }

    /// Append `users` to the group. Only an admin may do this.
    pub async fn add_participants(
        &self,
        group_id: ConversationId,
        admin: UserId,
        users: Vec<UserId>,
    ) -> ChatResult<Conversation> {
        let group = self.load_group(group_id).await?;
        ensure_admin(&group, admin)?;
        self.ensure_users_exist(&users).await?;

        let added = users.len();
        let group = self
            .store
            .update_conversation(group.id, ConversationUpdate::AppendParticipants(users))
            .await?;

        info!(group = %group.id, admin = %admin, added, "Participants added");
        Ok(group)
    }

    /// Remove those of `targets` that are currently participants. Targets
    /// outside the group are ignored; if none are members the group is
    /// returned unchanged.
    pub async fn remove_participants(
        &self,
        group_id: ConversationId,
        admin: UserId,
        targets: Vec<UserId>,
    ) -> ChatResult<Conversation> {
        let group = self.load_group(group_id).await?;
        ensure_admin(&group, admin)?;

        let members: Vec<UserId> = targets
            .into_iter()
            .filter(|target| group.is_participant(target))
            .collect();
        if members.is_empty() {
            return Ok(group);
        }

        let removed = members.len();
        let group = self
            .store
            .update_conversation(group.id, ConversationUpdate::RemoveParticipants(members))
            .await?;

        info!(group = %group.id, admin = %admin, removed, "Participants removed");
        Ok(group)
    }

    /// Remove `user` from the group. Leaving a group one is not part of is
    /// a no-op. The admin list is left as is.
    pub async fn leave_group(
        &self,
        group_id: ConversationId,
        user: UserId,
    ) -> ChatResult<Conversation> {
        let group = self.load_group(group_id).await?;
        if !group.is_participant(&user) {
            return Ok(group);
        }
        if group.is_admin(&user) {
            warn!(group = %group.id, user = %user, "Admin left group; admin list unchanged");
        }

        let group = self
            .store
            .update_conversation(group.id, ConversationUpdate::RemoveParticipants(vec![user]))
            .await?;

        info!(group = %group.id, user = %user, "User left group");
        Ok(group)
    }

    async fn load_group(&self, id: ConversationId) -> ChatResult<Conversation> {
        match self.store.find_conversation(ConversationFilter::Id(id)).await? {
            Some(conversation) if conversation.is_group_chat => Ok(conversation),
            _ => Err(ChatError::GroupNotFound),
        }
    }

    /// Every id must resolve to a distinct known user.
    async fn ensure_users_exist(&self, ids: &[UserId]) -> ChatResult<()> {
        let found = self.store.find_users_by_ids(ids).await?;
        if found.len() != ids.len() {
            return Err(ChatError::InvalidParticipants);
        }
        Ok(())
    }
}

fn ensure_admin(group: &Conversation, user: UserId) -> ChatResult<()> {
    if group.is_admin(&user) {
        Ok(())
    } else {
        Err(ChatError::NotAdmin)
    }
}
