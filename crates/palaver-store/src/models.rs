//! Persistence-side models.
//!
//! The entities themselves live in `palaver-shared` and are re-exported here;
//! this module adds the shapes used to create, look up and mutate them.

use palaver_shared::types::{ConversationId, MessageId, Recipient, UserId};

pub use palaver_shared::models::{Conversation, Message, User};

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// How to look a conversation up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFilter {
    /// Any conversation, direct or group, by id.
    Id(ConversationId),
    /// The non-group conversation between two users, in either order.
    DirectPair(UserId, UserId),
}

/// Fields of a conversation about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewConversation {
    Direct {
        participants: [UserId; 2],
    },
    Group {
        name: String,
        admin: UserId,
        /// Full participant list, admin included, as it should be stored.
        participants: Vec<UserId>,
        photo: Option<String>,
    },
}

/// A single mutation applied to a stored conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    /// Append to `participants` as given, duplicates included.
    AppendParticipants(Vec<UserId>),
    /// Drop every occurrence of each listed id from `participants`.
    RemoveParticipants(Vec<UserId>),
    /// Append a message id to `messages`.
    AppendMessage(MessageId),
}

impl ConversationUpdate {
    /// Apply the mutation to an in-memory copy.
    pub fn apply(&self, conversation: &mut Conversation) {
        match self {
            ConversationUpdate::AppendParticipants(ids) => {
                conversation.participants.extend(ids.iter().copied());
            }
            ConversationUpdate::RemoveParticipants(ids) => {
                conversation.participants.retain(|p| !ids.contains(p));
            }
            ConversationUpdate::AppendMessage(id) => conversation.messages.push(*id),
        }
    }
}

/// Canonical key of an unordered user pair.
pub fn pair_key(a: &UserId, b: &UserId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}:{high}")
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Fields of a message about to be created. The store assigns the id and
/// the creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver: Recipient,
    pub content: String,
    pub media: Option<String>,
    pub reply_to: Option<MessageId>,
    pub seen_by: Vec<UserId>,
}

/// A group conversation together with its resolved messages, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupThread {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
