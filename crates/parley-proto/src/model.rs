//! Backend record types.
//!
//! These structs deserialize the REST responses and realtime payloads without
//! transformation; field renames keep the Rust names idiomatic while the wire
//! stays `_id`/`camelCase`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable participant identifier assigned by the backend.
pub type UserId = String;

/// Stable conversation identifier assigned by the backend.
pub type ChatId = String;

/// Stable message identifier assigned by the backend.
pub type MessageId = String;

/// Participant presence as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Participant has an active transport connection.
    Online,
    /// No active connection.
    Offline,
}

/// A chat participant.
///
/// Presence is the only field mutated in place; contact lists are otherwise
/// replaced wholesale on re-fetch and entries are never deleted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Backend-assigned identity.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email, when the backend exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar reference (URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Current presence.
    pub status: Presence,
    /// Last time the participant was seen online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Message sender as it appears on the wire.
///
/// The backend denormalizes inconsistently: broadcast echoes carry a bare id
/// while fetched transcripts may expand the sender into a partial participant
/// record. Both shapes normalize to the id via [`SenderRef::id`] before any
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SenderRef {
    /// Bare identity.
    Id(UserId),
    /// Expanded participant record.
    Expanded {
        /// Backend-assigned identity.
        #[serde(rename = "_id")]
        id: UserId,
        /// Display name at send time.
        name: String,
    },
}

impl SenderRef {
    /// The sender's identity, regardless of wire shape.
    pub fn id(&self) -> &UserId {
        match self {
            Self::Id(id) | Self::Expanded { id, .. } => id,
        }
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Backend-assigned identity. Duplicate detection is by this field only.
    #[serde(rename = "_id")]
    pub id: MessageId,
    /// Owning conversation.
    pub chat_id: ChatId,
    /// Sender, in either wire shape.
    pub sender: SenderRef,
    /// Message text.
    pub content: String,
    /// Creation time as stamped by the sender. Clock skew across senders is
    /// expected; transcript order is arrival order, never timestamp order.
    pub timestamp: DateTime<Utc>,
    /// Read flag as known to the backend.
    #[serde(default)]
    pub read: bool,
}

/// A conversation between two or more participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Backend-assigned identity.
    #[serde(rename = "_id")]
    pub id: ChatId,
    /// Member records. Empty for placeholder entries created from events
    /// that reference a chat the snapshot has not delivered yet.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Denormalized most-recent message, for list rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<ChatMessage>,
    /// Unread counter. Zero whenever this chat is the active selection.
    #[serde(default)]
    pub unread_count: u32,
    /// Group chat flag.
    #[serde(default)]
    pub is_group: bool,
    /// Group display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Group avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_avatar: Option<String>,
}

impl Chat {
    /// The other party of a direct chat. `None` for groups or placeholders.
    pub fn peer(&self, me: &str) -> Option<&Participant> {
        if self.is_group {
            return None;
        }
        self.participants.iter().find(|p| p.id != me)
    }

    /// Whether this is a direct chat between `me` and `contact`.
    pub fn is_direct_with(&self, me: &str, contact: &str) -> bool {
        !self.is_group && self.peer(me).is_some_and(|p| p.id == contact)
    }

    /// Name shown in chat lists: group name, or the peer's display name.
    pub fn display_name(&self, me: &str) -> &str {
        if self.is_group {
            return self.group_name.as_deref().unwrap_or("Group Chat");
        }
        self.peer(me).map_or("Unknown User", |p| p.name.as_str())
    }
}
