//! Session side-effects.
//!
//! [`crate::Session::handle`] is pure: instead of doing I/O it returns
//! [`SessionAction`] instructions for the runtime to execute.

use parley_proto::{ChatId, ClientEvent, UserId};

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Re-render the observable state.
    Render,

    /// Emit a named event on the realtime connection.
    Emit(ClientEvent),

    /// Fetch the full transcript of a conversation. The result must come
    /// back as `TranscriptLoaded`/`TranscriptFailed` carrying the same id so
    /// the session can discard it if the selection has moved on.
    FetchTranscript {
        /// Conversation to fetch.
        chat_id: ChatId,
    },

    /// Ask the backend for a direct chat with a participant.
    CreateChat {
        /// The other participant.
        participant_id: UserId,
    },

    /// Ask the backend for a named group chat.
    CreateGroupChat {
        /// Group display name.
        name: String,
        /// Members besides the caller.
        participant_ids: Vec<UserId>,
    },

    /// Tear down the session loop and release subscriptions.
    Shutdown,
}
