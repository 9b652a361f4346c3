//! Real-time wire protocol.
//!
//! Every frame is a JSON object `{"event": <name>, "payload": <value>}`.
//! [`ClientEvent`] covers what clients send, [`ServerEvent`] what the server
//! pushes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Message};
use crate::types::{ConversationId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Events a client may send after opening a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientEvent {
    Join(JoinPayload),
    SendMessage(Envelope<SendMessageData>),
    SendGroupMessage(Envelope<SendGroupMessageData>),
    CreateGroup(Envelope<CreateGroupData>),
    AddParticipants(Envelope<MembershipData>),
    RemoveParticipants(Envelope<MembershipData>),
    LeaveGroup(Envelope<LeaveGroupData>),
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join(_) => "join",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::SendGroupMessage(_) => "sendGroupMessage",
            ClientEvent::CreateGroup(_) => "createGroup",
            ClientEvent::AddParticipants(_) => "addParticipants",
            ClientEvent::RemoveParticipants(_) => "removeParticipants",
            ClientEvent::LeaveGroup(_) => "leaveGroup",
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Most inbound payloads wrap their fields in a `data` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageData {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageData {
    pub group_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupData {
    pub group_name: String,
    /// Invitees. The admin is prepended by the server.
    pub participants: Vec<UserId>,
    pub group_admin: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_photo: Option<String>,
}

/// Payload shared by `addParticipants` and `removeParticipants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipData {
    pub group_id: ConversationId,
    pub admin_id: UserId,
    pub participants: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupData {
    pub group_id: ConversationId,
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Events pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "active_users")]
    ActiveUsers(Vec<ActiveUser>),
    #[serde(rename = "chat_history")]
    ChatHistory(Vec<HistoryEntry>),
    #[serde(rename = "newMessage")]
    NewMessage(Message),
    #[serde(rename = "newGroupMessage")]
    NewGroupMessage(GroupDelivery),
    #[serde(rename = "newGroup")]
    NewGroup(GroupAnnouncement),
    #[serde(rename = "participantsAdded")]
    ParticipantsAdded(GroupPayload),
    #[serde(rename = "participantsRemoved")]
    ParticipantsRemoved(GroupPayload),
    #[serde(rename = "leftGroup")]
    LeftGroup(GroupPayload),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ActiveUsers(_) => "active_users",
            ServerEvent::ChatHistory(_) => "chat_history",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::NewGroupMessage(_) => "newGroupMessage",
            ServerEvent::NewGroup(_) => "newGroup",
            ServerEvent::ParticipantsAdded(_) => "participantsAdded",
            ServerEvent::ParticipantsRemoved(_) => "participantsRemoved",
            ServerEvent::LeftGroup(_) => "leftGroup",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One entry of the presence list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub user_id: UserId,
    pub username: String,
}

/// A message as it appears in `chat_history`.
///
/// Group messages carry the group's id and name; direct messages leave
/// those fields out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub message: Message,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_group_message: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl HistoryEntry {
    pub fn direct(message: Message) -> Self {
        Self {
            message,
            is_group_message: false,
            group_id: None,
            group_name: None,
        }
    }

    pub fn group(message: Message, group: &Conversation) -> Self {
        Self {
            message,
            is_group_message: true,
            group_id: Some(group.id),
            group_name: group.group_name.clone(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.message.created_at
    }
}

/// Live delivery of a group message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupDelivery {
    pub group_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl GroupDelivery {
    pub fn from_message(group_id: ConversationId, message: &Message) -> Self {
        Self {
            group_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            timestamp: message.created_at,
        }
    }
}

/// Sent to every online member when a group is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupAnnouncement {
    pub id: ConversationId,
    pub name: Option<String>,
    pub members: Vec<UserId>,
    pub admin: Vec<UserId>,
    pub photo: Option<String>,
}

impl From<&Conversation> for GroupAnnouncement {
    fn from(group: &Conversation) -> Self {
        Self {
            id: group.id,
            name: group.group_name.clone(),
            members: group.participants.clone(),
            admin: group.group_admin.clone(),
            photo: group.group_photo.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupPayload {
    pub group: Conversation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub message: String,
}
