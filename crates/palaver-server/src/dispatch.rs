//! Message persistence for direct and group sends.
//!
//! The dispatcher only writes; delivery to live connections is done by the
//! session layer with the returned conversation.

use std::sync::Arc;

use tracing::debug;

use palaver_shared::types::{ConversationId, MessageId, Recipient, UserId};
use palaver_store::{
    Conversation, ConversationFilter, ConversationUpdate, Message, NewConversation, NewMessage,
};

use crate::error::{ChatError, ChatResult};
use crate::store::ChatStore;

#[derive(Clone)]
pub struct MessageDispatcher {
    store: Arc<dyn ChatStore>,
}

impl MessageDispatcher {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Persist a direct message from `sender` to `receiver`.
    ///
    /// The pair's conversation is created on first use. A `reply_to` must
    /// name a message already in that conversation.
    pub async fn send_direct(
        &self,
        sender: UserId,
        receiver: UserId,
        content: String,
        reply_to: Option<MessageId>,
        media: Option<String>,
    ) -> ChatResult<(Message, Conversation)> {
        if sender == receiver {
            return Err(ChatError::SelfMessage);
        }

        let conversation = self.direct_conversation(sender, receiver).await?;

        if let Some(reply_to) = reply_to {
            let exists = self.store.find_message(reply_to).await?.is_some();
            if !exists || !conversation.contains_message(&reply_to) {
                return Err(ChatError::InvalidReply);
            }
        }

        let message = self
            .store
            .create_message(NewMessage {
                sender_id: sender,
                receiver: Recipient::Direct(receiver),
                content,
                media,
                reply_to,
                seen_by: Vec::new(),
            })
            .await?;

        let conversation = self
            .store
            .update_conversation(conversation.id, ConversationUpdate::AppendMessage(message.id))
            .await?;

        debug!(
            message = %message.id,
            conversation = %conversation.id,
            sender = %sender,
            receiver = %receiver,
            "Direct message stored"
        );
        Ok((message, conversation))
    }

    /// Persist a message from `sender` to every member of `group_id`.
    pub async fn send_group(
        &self,
        group_id: ConversationId,
        sender: UserId,
        content: String,
        media: Option<String>,
    ) -> ChatResult<(Message, Conversation)> {
        let group = match self
            .store
            .find_conversation(ConversationFilter::Id(group_id))
            .await?
        {
            Some(conversation) if conversation.is_group_chat => conversation,
            _ => return Err(ChatError::GroupNotFound),
        };

        if !group.is_participant(&sender) {
            return Err(ChatError::NotParticipant);
        }

        let message = self
            .store
            .create_message(NewMessage {
                sender_id: sender,
                receiver: Recipient::Group(group.id),
                content,
                media,
                reply_to: None,
                seen_by: vec![sender],
            })
            .await?;

        let group = self
            .store
            .update_conversation(group.id, ConversationUpdate::AppendMessage(message.id))
            .await?;

        debug!(
            message = %message.id,
            group = %group.id,
            sender = %sender,
            "Group message stored"
        );
        Ok((message, group))
    }

    async fn direct_conversation(&self, a: UserId, b: UserId) -> ChatResult<Conversation> {
        if let Some(existing) = self
            .store
            .find_conversation(ConversationFilter::DirectPair(a, b))
            .await?
        {
            return Ok(existing);
        }

        let created = self
            .store
            .create_conversation(NewConversation::Direct {
                participants: [a, b],
            })
            .await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::GroupManager;
    use crate::store::test_support;

    #[tokio::test]
    async fn self_message_persists_nothing() {
        let (store, users) = test_support::seeded(&["alice"]).await;
        let alice = users[0].id;
        let dispatcher = MessageDispatcher::new(store.clone());

        let err = dispatcher
            .send_direct(alice, alice, "me".into(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SelfMessage));

        assert!(store.find_direct_messages_for_user(alice).await.unwrap().is_empty());
        assert!(store
            .find_conversation(ConversationFilter::DirectPair(alice, alice))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn both_directions_share_one_conversation() {
        let (store, users) = test_support::seeded(&["alice", "bob"]).await;
        let (alice, bob) = (users[0].id, users[1].id);
        let dispatcher = MessageDispatcher::new(store);

        let (first, conv_ab) = dispatcher
            .send_direct(alice, bob, "hi".into(), None, None)
            .await
            .unwrap();
        let (second, conv_ba) = dispatcher
            .send_direct(bob, alice, "hey".into(), None, None)
            .await
            .unwrap();

        assert_eq!(conv_ab.id, conv_ba.id);
        assert_eq!(conv_ba.messages, vec![first.id, second.id]);
        assert_eq!(first.receiver, Recipient::Direct(bob));
        assert!(first.seen_by.is_empty());
    }

    #[tokio::test]
    async fn reply_must_belong_to_the_conversation() {
        let (store, users) = test_support::seeded(&["alice", "bob", "carol"]).await;
        let (alice, bob, carol) = (users[0].id, users[1].id, users[2].id);
        let dispatcher = MessageDispatcher::new(store);

        let (original, _) = dispatcher
            .send_direct(alice, bob, "question".into(), None, None)
            .await
            .unwrap();
        let (elsewhere, _) = dispatcher
            .send_direct(alice, carol, "other".into(), None, None)
            .await
            .unwrap();

        let (reply, _) = dispatcher
            .send_direct(bob, alice, "answer".into(), Some(original.id), None)
            .await
            .unwrap();
        assert_eq!(reply.reply_to, Some(original.id));

        let err = dispatcher
            .send_direct(bob, alice, "wrong".into(), Some(elsewhere.id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidReply));

        let err = dispatcher
            .send_direct(bob, alice, "ghost".into(), Some(MessageId::new()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidReply));
    }

    #[tokio::test]
    async fn group_send_checks_membership() {
        let (store, users) = test_support::seeded(&["admin", "bob", "eve"]).await;
        let (admin, bob, eve) = (users[0].id, users[1].id, users[2].id);
        let group = GroupManager::new(store.clone())
            .create_group(admin, "Team".into(), vec![bob], None)
            .await
            .unwrap();
        let dispatcher = MessageDispatcher::new(store);

        let (message, group) = dispatcher
            .send_group(group.id, bob, "hello team".into(), Some("pic.png".into()))
            .await
            .unwrap();
        assert_eq!(message.receiver, Recipient::Group(group.id));
        assert_eq!(message.seen_by, vec![bob]);
        assert_eq!(message.media.as_deref(), Some("pic.png"));
        assert_eq!(group.messages, vec![message.id]);

        let err = dispatcher
            .send_group(group.id, eve, "let me in".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotParticipant));

        let err = dispatcher
            .send_group(ConversationId::new(), bob, "nowhere".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::GroupNotFound));
    }

    #[tokio::test]
    async fn direct_conversation_is_not_a_group() {
        let (store, users) = test_support::seeded(&["alice", "bob"]).await;
        let (alice, bob) = (users[0].id, users[1].id);
        let dispatcher = MessageDispatcher::new(store);

        let (_, conversation) = dispatcher
            .send_direct(alice, bob, "hi".into(), None, None)
            .await
            .unwrap();

        let err = dispatcher
            .send_group(conversation.id, alice, "sneaky".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::GroupNotFound));
    }
}
