//! CRUD operations for [`Conversation`] records.

use palaver_shared::types::{ConversationId, MessageId, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{
    format_timestamp, not_found, now, parse_json, parse_timestamp, parse_uuid, Database,
};
use crate::error::{Result, StoreError};
use crate::models::{pair_key, Conversation, ConversationFilter, ConversationUpdate, NewConversation};

const COLUMNS: &str = "id, is_group_chat, group_name, group_photo, participants, group_admin,
                       messages, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new conversation.
    ///
    /// Direct conversations are unique per unordered pair: creating one that
    /// already exists returns the stored conversation instead.
    pub fn insert_conversation(&self, new: &NewConversation) -> Result<Conversation> {
        let ts = now();
        let conversation = match new {
            NewConversation::Direct { participants } => Conversation {
                id: ConversationId::new(),
                participants: participants.to_vec(),
                messages: Vec::new(),
                is_group_chat: false,
                group_name: None,
                group_admin: Vec::new(),
                group_photo: None,
                created_at: ts,
                updated_at: ts,
            },
            NewConversation::Group {
                name,
                admin,
                participants,
                photo,
            } => Conversation {
                id: ConversationId::new(),
                participants: participants.clone(),
                messages: Vec::new(),
                is_group_chat: true,
                group_name: Some(name.clone()),
                group_admin: vec![*admin],
                group_photo: photo.clone(),
                created_at: ts,
                updated_at: ts,
            },
        };

        let key = match new {
            NewConversation::Direct { participants: [a, b] } => Some(pair_key(a, b)),
            NewConversation::Group { .. } => None,
        };

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO conversations
                 (id, is_group_chat, group_name, group_photo, participants, group_admin,
                  messages, pair_key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                conversation.id.to_string(),
                conversation.is_group_chat,
                conversation.group_name,
                conversation.group_photo,
                serde_json::to_string(&conversation.participants)?,
                serde_json::to_string(&conversation.group_admin)?,
                serde_json::to_string(&conversation.messages)?,
                key,
                format_timestamp(&conversation.created_at),
                format_timestamp(&conversation.updated_at),
            ],
        )?;

        if inserted == 0 {
            // Lost a find-or-create race on the pair key.
            if let NewConversation::Direct { participants: [a, b] } = new {
                return self.find_direct_conversation(*a, *b)?.ok_or(StoreError::NotFound);
            }
        }

        Ok(conversation)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_conversation(&self, id: ConversationId) -> Result<Conversation> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1"),
                params![id.to_string()],
                row_to_conversation,
            )
            .map_err(not_found)
    }

    /// The non-group conversation between `a` and `b`, if any.
    pub fn find_direct_conversation(&self, a: UserId, b: UserId) -> Result<Option<Conversation>> {
        let conversation = self
            .conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE pair_key = ?1"),
                params![pair_key(&a, &b)],
                row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    pub fn find_conversation(&self, filter: &ConversationFilter) -> Result<Option<Conversation>> {
        match filter {
            ConversationFilter::Id(id) => match self.get_conversation(*id) {
                Ok(conversation) => Ok(Some(conversation)),
                Err(StoreError::NotFound) => Ok(None),
                Err(e) => Err(e),
            },
            ConversationFilter::DirectPair(a, b) => self.find_direct_conversation(*a, *b),
        }
    }

    /// Group conversations listing `user` as a participant, oldest first.
    pub fn list_group_conversations_for_user(&self, user: UserId) -> Result<Vec<Conversation>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM conversations
             WHERE is_group_chat = 1
               AND EXISTS (SELECT 1 FROM json_each(conversations.participants)
                           WHERE json_each.value = ?1)
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![user.to_string()], row_to_conversation)?;

        let mut conversations = Vec::new();
        for row in rows {
            conversations.push(row?);
        }
        Ok(conversations)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply `update` to the stored conversation and return the new state.
    pub fn update_conversation(
        &self,
        id: ConversationId,
        update: &ConversationUpdate,
    ) -> Result<Conversation> {
        let tx = self.conn().unchecked_transaction()?;

        let mut conversation = self.get_conversation(id)?;
        update.apply(&mut conversation);
        conversation.updated_at = now();

        tx.execute(
            "UPDATE conversations
                SET participants = ?1, messages = ?2, updated_at = ?3
              WHERE id = ?4",
            params![
                serde_json::to_string(&conversation.participants)?,
                serde_json::to_string(&conversation.messages)?,
                format_timestamp(&conversation.updated_at),
                id.to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(conversation)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` selected with [`COLUMNS`] to a [`Conversation`].
fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let id: String = row.get(0)?;
    let is_group_chat: bool = row.get(1)?;
    let group_name: Option<String> = row.get(2)?;
    let group_photo: Option<String> = row.get(3)?;
    let participants: String = row.get(4)?;
    let group_admin: String = row.get(5)?;
    let messages: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Conversation {
        id: ConversationId(parse_uuid(0, &id)?),
        participants: parse_json::<Vec<UserId>>(4, &participants)?,
        messages: parse_json::<Vec<MessageId>>(6, &messages)?,
        is_group_chat,
        group_name,
        group_admin: parse_json::<Vec<UserId>>(5, &group_admin)?,
        group_photo,
        created_at: parse_timestamp(7, &created_at)?,
        updated_at: parse_timestamp(8, &updated_at)?,
    })
}
