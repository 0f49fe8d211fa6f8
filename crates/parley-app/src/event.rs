//! Session input events.
//!
//! Everything that can change synchronizer state arrives as a
//! [`SessionEvent`], from three sources:
//!
//! - the transport (decoded [`ServerEvent`]s and connection transitions),
//! - the UI (selection, composing, submission intents),
//! - completions of work the session previously requested (snapshot,
//!   transcript fetch, chat creation).
//!
//! All three funnel into one [`crate::Session::handle`] call site, which is
//! what serializes state mutation.
//!
//! Generic over `I` (Instant type) so the debounce logic runs under real or
//! virtual time; only `InputChanged` and `Tick` carry time.

use chrono::{DateTime, Utc};
use parley_proto::{Chat, ChatId, ChatMessage, Participant, ServerEvent, UserId};

/// Events processed by the session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Decoded realtime event from the transport.
    Server(ServerEvent),

    /// Transport connection went up or down.
    ConnectionChanged {
        /// New connected flag.
        connected: bool,
    },

    /// Open a conversation. Re-selecting the active one is the explicit
    /// "read the current chat" action and re-zeros a stale counter.
    SelectChat {
        /// Conversation to open.
        chat_id: ChatId,
    },

    /// Open the assistant pseudo-conversation.
    SelectAssistant,

    /// Navigate away from any conversation.
    Deselect,

    /// The compose input changed (a keystroke).
    InputChanged {
        /// Full input text after the keystroke.
        text: String,
        /// Keystroke time, for the trailing-edge typing timer.
        now: I,
    },

    /// Submit the compose input to the open conversation.
    Submit {
        /// Client-side send time stamped onto the outbound payload.
        at: DateTime<Utc>,
    },

    /// Open (creating if necessary) a direct chat with a contact.
    StartChat {
        /// The other participant.
        contact_id: UserId,
    },

    /// Create a named group chat.
    StartGroupChat {
        /// Group display name.
        name: String,
        /// Members besides the caller.
        member_ids: Vec<UserId>,
    },

    /// Clear the transient notice.
    DismissNotice,

    /// End the session; the runtime tears down subscriptions.
    Logout,

    /// Initial snapshot arrived.
    SnapshotLoaded {
        /// Conversations, most recent first.
        chats: Vec<Chat>,
        /// Contacts with the caller already filtered out.
        contacts: Vec<Participant>,
    },

    /// Initial snapshot failed; previously loaded state stays untouched.
    SnapshotFailed {
        /// Human-readable failure description.
        reason: String,
    },

    /// A requested transcript arrived. Applied only if `chat_id` is still
    /// the active selection; otherwise discarded as stale.
    TranscriptLoaded {
        /// Conversation the fetch was issued for.
        chat_id: ChatId,
        /// Full transcript in backend order.
        messages: Vec<ChatMessage>,
    },

    /// A requested transcript failed.
    TranscriptFailed {
        /// Conversation the fetch was issued for.
        chat_id: ChatId,
        /// Human-readable failure description.
        reason: String,
    },

    /// Chat creation completed.
    ChatCreated {
        /// The new (or reused, on the server side) conversation.
        chat: Chat,
    },

    /// Chat creation failed.
    ChatCreateFailed {
        /// Human-readable failure description.
        reason: String,
    },

    /// An outbound `send_message` emission failed. Compose state is not
    /// restored.
    SendFailed {
        /// Human-readable failure description.
        reason: String,
    },

    /// Time tick for the trailing-edge typing timer.
    Tick {
        /// Current time.
        now: I,
    },
}
