//! Chat backend boundary.
//!
//! Request/response snapshot source. The backend owns persistence and
//! delivery; this client only reads snapshots and asks for new conversations.

use parley_proto::{Chat, ChatMessage, Participant, UserId};
use thiserror::Error;

/// Errors from the chat backend boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Request never reached the backend or the response was lost.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a failure status.
    #[error("backend rejected request: {status} {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Human-readable reason from the response body.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network faults and server-side failures are transient; a rejected
    /// request or an undecodable body will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// REST-style snapshot operations on the chat backend.
///
/// `create_chat` is idempotent on the server: asking for a direct chat with a
/// participant you already share one with returns the existing conversation,
/// never a second one.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// List every conversation the authenticated participant belongs to.
    async fn list_chats(&self) -> Result<Vec<Chat>, BackendError>;

    /// List every registered participant, including the caller.
    async fn list_users(&self) -> Result<Vec<Participant>, BackendError>;

    /// Fetch the full transcript of one conversation.
    async fn messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, BackendError>;

    /// Create (or return the existing) direct conversation with a participant.
    async fn create_chat(&self, participant_id: &str) -> Result<Chat, BackendError>;

    /// Create a named group conversation.
    async fn create_group_chat(
        &self,
        name: &str,
        participant_ids: &[UserId],
    ) -> Result<Chat, BackendError>;
}
