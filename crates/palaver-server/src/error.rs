use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use palaver_shared::types::UserId;
use palaver_store::StoreError;

/// Everything that can go wrong while handling a client event.
///
/// Each variant ends up as an `error` event on the originating connection;
/// see [`ChatError::client_message`].
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("You cannot send a message to yourself.")]
    SelfMessage,

    #[error("Invalid reply message")]
    InvalidReply,

    #[error("A group chat must have at least {min} participant(s) besides the admin")]
    TooFewParticipants { min: usize },

    #[error("Some participants are invalid")]
    InvalidParticipants,

    #[error("Group chat not found")]
    GroupNotFound,

    #[error("You are not the admin of this group")]
    NotAdmin,

    #[error("You are not a participant of this group")]
    NotParticipant,

    #[error("User not found: {0}")]
    UnknownUser(UserId),

    #[error("Join the chat before sending events")]
    NotJoined,

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ChatError {
    /// Text sent to the client. Storage failures are reported generically so
    /// internal details stay in the server log.
    pub fn client_message(&self) -> String {
        match self {
            ChatError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Short category name for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::SelfMessage
            | ChatError::InvalidReply
            | ChatError::TooFewParticipants { .. }
            | ChatError::InvalidParticipants
            | ChatError::MalformedEvent(_) => "validation",
            ChatError::GroupNotFound => "not_found",
            ChatError::NotAdmin | ChatError::NotParticipant | ChatError::NotJoined => {
                "unauthorized"
            }
            ChatError::UnknownUser(_) => "identity",
            ChatError::Store(_) => "internal",
        }
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Failures of the REST endpoints, rendered as `{"error": …}` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "REST request failed in storage");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
