//! Domain entities shared by the store, the server and clients.
//!
//! All structs serialize with camelCase field names, which is what the
//! real-time protocol puts on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, MessageId, Recipient, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. The chat core only ever reads users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A direct (two-party) or group conversation.
///
/// `participants` keeps insertion order and may hold duplicates when a
/// caller supplied them; membership checks treat it as a set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    /// Message ids in append order.
    pub messages: Vec<MessageId>,
    pub is_group_chat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub group_admin: Vec<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    pub fn is_admin(&self, user: &UserId) -> bool {
        self.group_admin.contains(user)
    }

    pub fn contains_message(&self, message: &MessageId) -> bool {
        self.messages.contains(message)
    }

    /// Participants with repeated ids collapsed, first occurrence wins.
    pub fn distinct_participants(&self) -> Vec<UserId> {
        let mut seen = Vec::with_capacity(self.participants.len());
        for id in &self.participants {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A persisted chat message. Immutable after creation except `seen_by`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(flatten)]
    pub receiver: Recipient,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    pub seen_by: Vec<UserId>,
    /// Sole ordering key for history.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(participants: Vec<UserId>) -> Conversation {
        Conversation {
            id: ConversationId::new(),
            participants,
            messages: Vec::new(),
            is_group_chat: true,
            group_name: Some("Team".into()),
            group_admin: Vec::new(),
            group_photo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn distinct_participants_keeps_first_occurrence() {
        let a = UserId::new();
        let b = UserId::new();
        let conv = conversation(vec![a, b, a]);
        assert_eq!(conv.distinct_participants(), vec![a, b]);
        assert!(conv.is_participant(&b));
    }

    #[test]
    fn message_wire_shape_flattens_receiver() {
        let receiver = UserId::new();
        let msg = Message {
            id: MessageId::new(),
            sender_id: UserId::new(),
            receiver: Recipient::Direct(receiver),
            content: "hi".into(),
            media: None,
            reply_to: None,
            seen_by: Vec::new(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["receiverKind"], "direct");
        assert_eq!(value["receiverId"], receiver.0.to_string());
        assert_eq!(value["content"], "hi");
        assert!(value.get("replyTo").is_none());
    }
}
