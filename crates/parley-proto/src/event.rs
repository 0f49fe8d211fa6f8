//! Realtime event envelopes.
//!
//! The transport speaks named events with JSON payloads. Event names and
//! payload shapes are an interoperability contract and must not drift:
//!
//! | Direction | Event          | Payload                                      |
//! |-----------|----------------|----------------------------------------------|
//! | in        | `new_message`  | `{ _id, chatId, sender, content, timestamp }`|
//! | in        | `user_status`  | `{ userId, status }`                         |
//! | in        | `typing`       | `{ chatId, isTyping }`                       |
//! | out       | `send_message` | `{ content, chatId, timestamp, sender }`     |
//! | out       | `typing`       | `{ chatId, isTyping }`                       |
//! | out       | `read_message` | `{ chatId }`                                 |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ChatId, ChatMessage, Presence, UserId};

/// Wire name of the inbound message broadcast.
pub const NEW_MESSAGE: &str = "new_message";
/// Wire name of the presence change broadcast.
pub const USER_STATUS: &str = "user_status";
/// Wire name of the typing indicator, both directions.
pub const TYPING: &str = "typing";
/// Wire name of the outbound message submission.
pub const SEND_MESSAGE: &str = "send_message";
/// Wire name of the outbound read acknowledgment.
pub const READ_MESSAGE: &str = "read_message";

/// Errors at the wire boundary.
#[derive(Debug, Error)]
pub enum WireError {
    /// Event name not part of the contract.
    #[error("unknown event name: {0}")]
    UnknownEvent(String),

    /// Payload did not match the declared shape for its event.
    #[error("malformed {event} payload: {source}")]
    Malformed {
        /// Wire name of the offending event.
        event: &'static str,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// Outbound payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Presence change payload (`user_status`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    /// Participant whose presence changed.
    pub user_id: UserId,
    /// New presence.
    pub status: Presence,
}

/// Typing indicator payload (`typing`), identical in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Conversation the indicator applies to.
    pub chat_id: ChatId,
    /// True on the start edge, false on the stop edge. The receiving side
    /// never infers a stop from elapsed time.
    pub is_typing: bool,
}

/// Outbound message submission payload (`send_message`).
///
/// Carries no id: the backend assigns one and reflects it in the broadcast
/// echo every subscriber (including this client) receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Message text.
    pub content: String,
    /// Target conversation.
    pub chat_id: ChatId,
    /// Client-side send time.
    pub timestamp: DateTime<Utc>,
    /// Sending participant.
    pub sender: UserId,
}

/// Outbound read acknowledgment payload (`read_message`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMessagePayload {
    /// Conversation whose messages were read.
    pub chat_id: ChatId,
}

/// Inbound realtime event, decoded from its wire name and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A message was created somewhere in the system.
    NewMessage(ChatMessage),
    /// A participant's presence changed.
    UserStatus(UserStatusPayload),
    /// A remote participant started or stopped typing.
    Typing(TypingPayload),
}

impl ServerEvent {
    /// Decode a named event received from the transport.
    pub fn parse(name: &str, payload: serde_json::Value) -> Result<Self, WireError> {
        match name {
            NEW_MESSAGE => serde_json::from_value(payload)
                .map(Self::NewMessage)
                .map_err(|source| WireError::Malformed { event: NEW_MESSAGE, source }),
            USER_STATUS => serde_json::from_value(payload)
                .map(Self::UserStatus)
                .map_err(|source| WireError::Malformed { event: USER_STATUS, source }),
            TYPING => serde_json::from_value(payload)
                .map(Self::Typing)
                .map_err(|source| WireError::Malformed { event: TYPING, source }),
            other => Err(WireError::UnknownEvent(other.to_string())),
        }
    }

    /// Wire name this event was decoded from.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => NEW_MESSAGE,
            Self::UserStatus(_) => USER_STATUS,
            Self::Typing(_) => TYPING,
        }
    }
}

/// Outbound realtime event, encoded to its wire name and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Submit a new message.
    SendMessage(SendMessagePayload),
    /// Broadcast a typing edge for the active conversation.
    Typing(TypingPayload),
    /// Acknowledge that the active conversation's messages were read.
    ReadMessage(ReadMessagePayload),
}

impl ClientEvent {
    /// Wire name to emit this event under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => SEND_MESSAGE,
            Self::Typing(_) => TYPING,
            Self::ReadMessage(_) => READ_MESSAGE,
        }
    }

    /// Encode the payload for emission.
    pub fn to_payload(&self) -> Result<serde_json::Value, WireError> {
        let value = match self {
            Self::SendMessage(p) => serde_json::to_value(p)?,
            Self::Typing(p) => serde_json::to_value(p)?,
            Self::ReadMessage(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}
