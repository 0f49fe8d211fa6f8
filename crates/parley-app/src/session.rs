//! Session state machine.
//!
//! [`Session`] is the single owner of the synchronizer's in-memory state:
//! conversations, contacts, the visible transcript, unread counters, typing
//! flags, and the active selection. It is a pure state machine: it consumes
//! [`SessionEvent`] inputs and produces [`SessionAction`] instructions for
//! the runtime to execute, so every reconciliation rule is testable without
//! I/O or real time.
//!
//! Two sources of truth are folded together here: request/response snapshots
//! (chat list, contact list, per-chat transcripts) and the push event stream
//! (`new_message`, `user_status`, `typing`). Events are handled strictly one
//! at a time; callers only read state through accessors and submit events.

use std::{collections::HashMap, ops::Sub, time::Duration};

use chrono::{DateTime, Utc};
use parley_proto::{
    Chat, ChatId, ChatMessage, ClientEvent, Participant, ReadMessagePayload, SendMessagePayload,
    SenderRef, ServerEvent, TypingPayload, UserStatusPayload,
};

use crate::{ConnectionState, Selection, SessionAction, SessionEvent, TypingCoordinator};

/// Pseudo chat id of the session-local assistant transcript.
const ASSISTANT_CHAT_ID: &str = "assistant";

/// Conversation-state synchronizer for one logged-in participant.
#[derive(Debug, Clone)]
pub struct Session<I = std::time::Instant> {
    /// The authenticated participant.
    me: Participant,
    /// Mirrored transport state, for UI feedback.
    connection: ConnectionState,
    /// All known conversations, including placeholders created from events
    /// that referenced a chat the snapshot had not delivered.
    chats: HashMap<ChatId, Chat>,
    /// List order, most recently started first.
    chat_order: Vec<ChatId>,
    /// Contacts with the caller filtered out. Replaced wholesale on
    /// snapshot load, presence patched in place by `user_status`.
    contacts: Vec<Participant>,
    /// The single conversation currently displayed.
    selection: Selection,
    /// Visible transcript of the viewed conversation, in arrival order.
    transcript: Vec<ChatMessage>,
    /// A transcript fetch is outstanding for the current selection.
    transcript_loading: bool,
    /// Session-local assistant transcript; never touches the backend.
    assistant_transcript: Vec<ChatMessage>,
    /// Remote typing indicator for the viewed conversation.
    peer_typing: bool,
    /// Debounced local typing half.
    typing: TypingCoordinator<I>,
    /// Compose input buffer.
    input: String,
    /// Monotonic counter for provisional local message ids.
    local_seq: u64,
    /// Transient dismissible notice.
    notice: Option<String>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a session for the given authenticated participant.
    pub fn new(me: Participant) -> Self {
        Self {
            me,
            connection: ConnectionState::Disconnected,
            chats: HashMap::new(),
            chat_order: Vec::new(),
            contacts: Vec::new(),
            selection: Selection::Idle,
            transcript: Vec::new(),
            transcript_loading: false,
            assistant_transcript: Vec::new(),
            peer_typing: false,
            typing: TypingCoordinator::new(),
            input: String::new(),
            local_seq: 0,
            notice: None,
        }
    }

    /// Process one event and return the side effects to execute.
    pub fn handle(&mut self, event: SessionEvent<I>) -> Vec<SessionAction> {
        match event {
            SessionEvent::Server(server) => self.handle_server(server),
            SessionEvent::ConnectionChanged { connected } => {
                self.connection =
                    if connected { ConnectionState::Connected } else { ConnectionState::Disconnected };
                vec![SessionAction::Render]
            },
            SessionEvent::SelectChat { chat_id } => self.select_chat(chat_id),
            SessionEvent::SelectAssistant => self.select_assistant(),
            SessionEvent::Deselect => self.deselect(),
            SessionEvent::InputChanged { text, now } => self.input_changed(text, now),
            SessionEvent::Submit { at } => self.submit(at),
            SessionEvent::StartChat { contact_id } => self.start_chat(&contact_id),
            SessionEvent::StartGroupChat { name, member_ids } => {
                vec![
                    SessionAction::CreateGroupChat { name, participant_ids: member_ids },
                    SessionAction::Render,
                ]
            },
            SessionEvent::DismissNotice => {
                self.notice = None;
                vec![SessionAction::Render]
            },
            SessionEvent::Logout => {
                self.deselect();
                vec![SessionAction::Shutdown]
            },
            SessionEvent::SnapshotLoaded { chats, contacts } => {
                self.apply_snapshot(chats, contacts)
            },
            SessionEvent::SnapshotFailed { reason } => {
                tracing::warn!(%reason, "snapshot load failed");
                self.notice = Some("Failed to load data. Please try again.".into());
                vec![SessionAction::Render]
            },
            SessionEvent::TranscriptLoaded { chat_id, messages } => {
                self.apply_transcript(chat_id, messages)
            },
            SessionEvent::TranscriptFailed { chat_id, reason } => {
                if !self.selection.is_viewing(&chat_id) {
                    tracing::debug!(%chat_id, "discarding stale transcript failure");
                    return vec![];
                }
                tracing::warn!(%chat_id, %reason, "transcript load failed");
                self.transcript_loading = false;
                self.notice = Some("Failed to load messages".into());
                vec![SessionAction::Render]
            },
            SessionEvent::ChatCreated { chat } => self.chat_created(chat),
            SessionEvent::ChatCreateFailed { reason } => {
                tracing::warn!(%reason, "chat creation failed");
                self.notice = Some("Failed to start chat".into());
                vec![SessionAction::Render]
            },
            SessionEvent::SendFailed { reason } => {
                tracing::warn!(%reason, "send_message emission failed");
                self.notice = Some("Failed to send message. Please try again.".into());
                vec![SessionAction::Render]
            },
            SessionEvent::Tick { now } => {
                self.typing.tick(now).map_or_else(Vec::new, |stop| vec![SessionAction::Emit(stop)])
            },
        }
    }

    fn handle_server(&mut self, event: ServerEvent) -> Vec<SessionAction> {
        match event {
            ServerEvent::NewMessage(message) => self.message_created(message),
            ServerEvent::UserStatus(status) => self.presence_changed(&status),
            ServerEvent::Typing(payload) => self.remote_typing(&payload),
        }
    }

    /// Fold a `new_message` broadcast into the state.
    ///
    /// The transcript only grows when the owning chat is the one displayed;
    /// the chat list entry (last message, unread counter) updates regardless.
    /// An event for a locally unknown chat creates a placeholder entry so the
    /// counter is not lost; the transcript backfills when the chat is
    /// opened.
    fn message_created(&mut self, message: ChatMessage) -> Vec<SessionAction> {
        let chat_id = message.chat_id.clone();
        let viewing = self.selection.is_viewing(&chat_id);
        let mut actions = Vec::new();

        if viewing {
            // Duplicate suppression is by identifier only; identical content
            // from a legitimate resend is a distinct message.
            if !self.transcript.iter().any(|m| m.id == message.id) {
                self.transcript.push(message.clone());
            }
            actions.push(SessionAction::Emit(ClientEvent::ReadMessage(ReadMessagePayload {
                chat_id: chat_id.clone(),
            })));
        }

        if let Some(chat) = self.chats.get_mut(&chat_id) {
            chat.last_message = Some(message);
            chat.unread_count = if viewing { 0 } else { chat.unread_count + 1 };
        } else {
            tracing::debug!(%chat_id, "message for unknown chat, creating placeholder");
            let chat = Chat {
                id: chat_id.clone(),
                participants: Vec::new(),
                last_message: Some(message),
                unread_count: u32::from(!viewing),
                is_group: false,
                group_name: None,
                group_avatar: None,
            };
            self.chat_order.insert(0, chat_id.clone());
            self.chats.insert(chat_id, chat);
        }

        actions.push(SessionAction::Render);
        actions
    }

    fn presence_changed(&mut self, status: &UserStatusPayload) -> Vec<SessionAction> {
        match self.contacts.iter_mut().find(|c| c.id == status.user_id) {
            Some(contact) => {
                contact.status = status.status;
                vec![SessionAction::Render]
            },
            None => {
                tracing::debug!(user_id = %status.user_id, "presence for unknown participant");
                vec![]
            },
        }
    }

    fn remote_typing(&mut self, payload: &TypingPayload) -> Vec<SessionAction> {
        // No background typing badges: events for other chats are discarded.
        if !self.selection.is_viewing(&payload.chat_id) {
            return vec![];
        }
        self.peer_typing = payload.is_typing;
        vec![SessionAction::Render]
    }

    /// Open a conversation.
    ///
    /// Unknown ids are ignored; placeholder entries created from events count
    /// as known. Re-selecting the active chat re-runs the read/zero step,
    /// which is the explicit "read the current chat" action for a stale
    /// counter.
    fn select_chat(&mut self, chat_id: ChatId) -> Vec<SessionAction> {
        if !self.chats.contains_key(&chat_id) {
            tracing::debug!(%chat_id, "ignoring selection of unknown chat");
            return vec![];
        }

        let mut actions = Vec::new();
        // Pending local typing is dropped without a stop edge on switch.
        self.typing.cancel();
        self.peer_typing = false;

        if let Some(chat) = self.chats.get_mut(&chat_id)
            && chat.unread_count > 0
        {
            chat.unread_count = 0;
            actions.push(SessionAction::Emit(ClientEvent::ReadMessage(ReadMessagePayload {
                chat_id: chat_id.clone(),
            })));
        }

        self.selection = Selection::Viewing(chat_id.clone());
        self.transcript.clear();
        self.transcript_loading = true;
        actions.push(SessionAction::FetchTranscript { chat_id });
        actions.push(SessionAction::Render);
        actions
    }

    fn select_assistant(&mut self) -> Vec<SessionAction> {
        self.typing.cancel();
        self.peer_typing = false;
        self.selection = Selection::Assistant;
        self.transcript.clear();
        self.transcript_loading = false;
        vec![SessionAction::Render]
    }

    fn deselect(&mut self) -> Vec<SessionAction> {
        self.typing.cancel();
        self.peer_typing = false;
        self.selection = Selection::Idle;
        self.transcript.clear();
        self.transcript_loading = false;
        vec![SessionAction::Render]
    }

    fn input_changed(&mut self, text: String, now: I) -> Vec<SessionAction> {
        self.input = text;

        let mut actions = Vec::new();
        if let Selection::Viewing(chat_id) = &self.selection {
            let chat_id = chat_id.clone();
            if let Some(start) = self.typing.keystroke(&chat_id, now) {
                actions.push(SessionAction::Emit(start));
            }
        }
        actions.push(SessionAction::Render);
        actions
    }

    /// Submit the compose input.
    ///
    /// The input is cleared before emission and not restored on failure. The
    /// message appears in the transcript only when the broadcast echo comes
    /// back; the provisional local id exists so logs can correlate the
    /// submission with its echo, nothing more.
    fn submit(&mut self, at: DateTime<Utc>) -> Vec<SessionAction> {
        if self.input.trim().is_empty() {
            return vec![];
        }

        match self.selection.clone() {
            Selection::Idle => vec![],
            Selection::Assistant => {
                let content = std::mem::take(&mut self.input);
                let local_id = self.next_local_id();
                self.assistant_transcript.push(ChatMessage {
                    id: local_id,
                    chat_id: ASSISTANT_CHAT_ID.into(),
                    sender: SenderRef::Id(self.me.id.clone()),
                    content,
                    timestamp: at,
                    read: true,
                });
                vec![SessionAction::Render]
            },
            Selection::Viewing(chat_id) => {
                let content = std::mem::take(&mut self.input);
                let local_id = self.next_local_id();

                if self.connection != ConnectionState::Connected {
                    // Input is already gone; surfacing the failure is all
                    // that happens.
                    self.notice = Some("Failed to send message. Please try again.".into());
                    return vec![SessionAction::Render];
                }

                tracing::debug!(%local_id, %chat_id, "submitting message");
                vec![
                    SessionAction::Emit(ClientEvent::SendMessage(SendMessagePayload {
                        content,
                        chat_id,
                        timestamp: at,
                        sender: self.me.id.clone(),
                    })),
                    SessionAction::Render,
                ]
            },
        }
    }

    /// Open (creating if necessary) a direct chat with a contact.
    ///
    /// An existing direct chat is reused without a backend round trip, which
    /// keeps repeated requests converging on one conversation id even when
    /// the network is unreachable.
    fn start_chat(&mut self, contact_id: &str) -> Vec<SessionAction> {
        let existing = self
            .chats
            .values()
            .find(|c| c.is_direct_with(&self.me.id, contact_id))
            .map(|c| c.id.clone());

        match existing {
            Some(chat_id) => self.select_chat(chat_id),
            None => vec![
                SessionAction::CreateChat { participant_id: contact_id.to_owned() },
                SessionAction::Render,
            ],
        }
    }

    fn chat_created(&mut self, chat: Chat) -> Vec<SessionAction> {
        let chat_id = chat.id.clone();
        // The backend creates idempotently, so the returned chat may already
        // be known locally.
        if !self.chats.contains_key(&chat_id) {
            self.chat_order.insert(0, chat_id.clone());
            self.chats.insert(chat_id.clone(), chat);
        }
        self.select_chat(chat_id)
    }

    fn apply_snapshot(
        &mut self,
        chats: Vec<Chat>,
        contacts: Vec<Participant>,
    ) -> Vec<SessionAction> {
        self.chat_order = chats.iter().map(|c| c.id.clone()).collect();
        self.chats = chats.into_iter().map(|c| (c.id.clone(), c)).collect();
        self.contacts = contacts;
        vec![SessionAction::Render]
    }

    /// Apply a fetched transcript, unless the selection has moved on.
    ///
    /// Messages that arrived over the stream while the fetch was in flight
    /// are already displayed; they are kept (after the fetched base, without
    /// reordering) when the fetch missed them.
    fn apply_transcript(
        &mut self,
        chat_id: ChatId,
        messages: Vec<ChatMessage>,
    ) -> Vec<SessionAction> {
        if !self.selection.is_viewing(&chat_id) {
            tracing::debug!(%chat_id, "discarding stale transcript result");
            return vec![];
        }

        let displayed = std::mem::take(&mut self.transcript);
        self.transcript = messages;
        for message in displayed {
            if !self.transcript.iter().any(|m| m.id == message.id) {
                self.transcript.push(message);
            }
        }
        self.transcript_loading = false;
        vec![SessionAction::Render]
    }

    fn next_local_id(&mut self) -> String {
        self.local_seq += 1;
        format!("local-{}", self.local_seq)
    }

    /// The authenticated participant.
    pub fn me(&self) -> &Participant {
        &self.me
    }

    /// Mirrored transport connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Conversations in list order, most recently started first.
    pub fn chats(&self) -> impl Iterator<Item = &Chat> {
        self.chat_order.iter().filter_map(|id| self.chats.get(id))
    }

    /// One conversation by id.
    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.get(chat_id)
    }

    /// Unread counter for a conversation. Zero for unknown ids.
    pub fn unread_count(&self, chat_id: &str) -> u32 {
        self.chats.get(chat_id).map_or(0, |c| c.unread_count)
    }

    /// Contacts, caller excluded.
    pub fn contacts(&self) -> &[Participant] {
        &self.contacts
    }

    /// The active selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Visible transcript of the viewed conversation, arrival order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Whether a transcript fetch is outstanding for the current selection.
    pub fn transcript_loading(&self) -> bool {
        self.transcript_loading
    }

    /// Session-local assistant transcript.
    pub fn assistant_transcript(&self) -> &[ChatMessage] {
        &self.assistant_transcript
    }

    /// Remote typing indicator for the viewed conversation.
    pub fn peer_typing(&self) -> bool {
        self.peer_typing
    }

    /// Compose input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Transient dismissible notice.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
