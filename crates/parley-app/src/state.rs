//! Observable session state types.
//!
//! These enums are the subset of synchronizer state the UI needs for
//! rendering decisions, exposed read-only through [`crate::Session`]
//! accessors.

use parley_proto::ChatId;

/// Transport connection state, for UI feedback only.
///
/// The transport provider owns reconnection; the session just mirrors the
/// up/down transitions it is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No realtime connection.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Live event stream.
    Connected,
}

/// The single conversation (if any) currently displayed.
///
/// Exactly one of the three holds at a time; the assistant is a synthetic
/// selection with no backend entity behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing open; transcript events do not apply.
    Idle,
    /// An ordinary conversation is open.
    Viewing(ChatId),
    /// The assistant pseudo-conversation is open.
    Assistant,
}

impl Selection {
    /// Whether the given chat is the one currently displayed.
    pub fn is_viewing(&self, chat_id: &str) -> bool {
        matches!(self, Self::Viewing(id) if id == chat_id)
    }
}
