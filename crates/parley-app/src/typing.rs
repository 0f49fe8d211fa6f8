//! Outbound typing indicator with trailing-edge suppression.
//!
//! Every composing keystroke should tell the far side "typing" exactly once
//! per burst, and "stopped" exactly once per idle period. The coordinator
//! keeps a signaling flag and the time of the last keystroke; the session's
//! periodic `Tick` drives the stop edge, so no background timer exists and
//! the logic runs identically under virtual time.

use std::{ops::Sub, time::Duration};

use parley_proto::{ChatId, ClientEvent, TypingPayload};

/// Quiet period after the last keystroke before the stop edge fires.
pub const TYPING_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Debounced local half of the typing indicator.
///
/// The remote half is strictly event-driven and lives in the session; this
/// type only decides when to emit `typing` for our own activity.
#[derive(Debug, Clone)]
pub struct TypingCoordinator<I> {
    signaling: bool,
    last_keystroke: Option<I>,
    chat_id: Option<ChatId>,
}

impl<I> Default for TypingCoordinator<I> {
    fn default() -> Self {
        Self { signaling: false, last_keystroke: None, chat_id: None }
    }
}

impl<I> TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a start edge has been emitted without its stop edge yet.
    pub fn signaling(&self) -> bool {
        self.signaling
    }

    /// Register a keystroke in the given conversation.
    ///
    /// Returns the start-edge event on the false→true transition; every
    /// further keystroke only pushes the pending stop edge out.
    pub fn keystroke(&mut self, chat_id: &str, now: I) -> Option<ClientEvent> {
        self.last_keystroke = Some(now);
        self.chat_id = Some(chat_id.to_owned());

        if self.signaling {
            return None;
        }
        self.signaling = true;
        Some(ClientEvent::Typing(TypingPayload { chat_id: chat_id.to_owned(), is_typing: true }))
    }

    /// Advance time. Returns the stop-edge event once the quiet period has
    /// elapsed with no further keystroke.
    pub fn tick(&mut self, now: I) -> Option<ClientEvent> {
        if !self.signaling {
            return None;
        }
        let last = self.last_keystroke?;
        if now < last || now - last < TYPING_DEBOUNCE {
            return None;
        }

        self.signaling = false;
        self.last_keystroke = None;
        let chat_id = self.chat_id.take()?;
        Some(ClientEvent::Typing(TypingPayload { chat_id, is_typing: false }))
    }

    /// Drop any pending stop edge without emitting it.
    ///
    /// Used on conversation switch and teardown. The far side is left to
    /// clear its indicator from the next start edge or its own policy.
    pub fn cancel(&mut self) {
        self.signaling = false;
        self.last_keystroke = None;
        self.chat_id = None;
    }
}
