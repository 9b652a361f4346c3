use palaver_shared::types::{ConversationId, MessageId, Recipient, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{
    format_timestamp, not_found, now, parse_json, parse_timestamp, parse_uuid, Database,
};
use crate::error::Result;
use crate::models::{GroupThread, Message, NewMessage};

const COLUMNS: &str =
    "id, sender_id, receiver_kind, receiver_id, content, media, reply_to, seen_by, created_at";

impl Database {
    pub fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        let message = Message {
            id: MessageId::new(),
            sender_id: new.sender_id,
            receiver: new.receiver,
            content: new.content.clone(),
            media: new.media.clone(),
            reply_to: new.reply_to,
            seen_by: new.seen_by.clone(),
            created_at: now(),
        };

        let receiver_id = match message.receiver {
            Recipient::Direct(user) => user.to_string(),
            Recipient::Group(group) => group.to_string(),
        };

        self.conn().execute(
            "INSERT INTO messages
                 (id, sender_id, receiver_kind, receiver_id, content, media, reply_to,
                  seen_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                message.id.to_string(),
                message.sender_id.to_string(),
                message.receiver.kind(),
                receiver_id,
                message.content,
                message.media,
                message.reply_to.map(|id| id.to_string()),
                serde_json::to_string(&message.seen_by)?,
                format_timestamp(&message.created_at),
            ],
        )?;

        Ok(message)
    }

    pub fn get_message(&self, id: MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(not_found)
    }

    pub fn find_message(&self, id: MessageId) -> Result<Option<Message>> {
        let message = self
            .conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// Direct messages sent or received by `user`, oldest first.
    pub fn get_direct_messages_for_user(&self, user: UserId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM messages
             WHERE receiver_kind = 'direct'
               AND (sender_id = ?1 OR receiver_id = ?1)
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![user.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Resolve message ids, oldest first. Unknown ids are skipped.
    ///
    /// The ids travel as a single JSON array bound to one parameter, so the
    /// list may be longer than SQLite's host-parameter limit.
    pub fn get_messages_by_ids(&self, ids: &[MessageId]) -> Result<Vec<Message>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM messages
             WHERE id IN (SELECT value FROM json_each(?1))
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![serde_json::to_string(ids)?], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Every group `user` belongs to, with its messages resolved.
    pub fn get_group_threads_for_user(&self, user: UserId) -> Result<Vec<GroupThread>> {
        let groups = self.list_group_conversations_for_user(user)?;

        let mut threads = Vec::with_capacity(groups.len());
        for conversation in groups {
            let messages = self.get_messages_by_ids(&conversation.messages)?;
            threads.push(GroupThread {
                conversation,
                messages,
            });
        }
        Ok(threads)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let sender_id: String = row.get(1)?;
    let receiver_kind: String = row.get(2)?;
    let receiver_id: String = row.get(3)?;
    let content: String = row.get(4)?;
    let media: Option<String> = row.get(5)?;
    let reply_to: Option<String> = row.get(6)?;
    let seen_by: String = row.get(7)?;
    let created_at: String = row.get(8)?;

    let receiver_uuid = parse_uuid(3, &receiver_id)?;
    let receiver = match receiver_kind.as_str() {
        "group" => Recipient::Group(ConversationId(receiver_uuid)),
        _ => Recipient::Direct(UserId(receiver_uuid)),
    };

    Ok(Message {
        id: MessageId(parse_uuid(0, &id)?),
        sender_id: UserId(parse_uuid(1, &sender_id)?),
        receiver,
        content,
        media,
        reply_to: reply_to
            .map(|raw| parse_uuid(6, &raw).map(MessageId))
            .transpose()?,
        seen_by: parse_json(7, &seen_by)?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}
