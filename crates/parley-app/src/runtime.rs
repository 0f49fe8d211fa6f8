//! Generic runtime for session orchestration.
//!
//! The runtime drives the event loop: poll the [`Driver`] for the next input,
//! fold it into the [`Session`], execute the resulting actions, drain
//! completions of spawned backend work, tick. Backend fetches (transcripts,
//! chat creation) run as spawned tasks reporting back through a channel, so a
//! selection switch can overtake an in-flight fetch and the session's
//! stale-result check is exercised for real, not just in tests.

use std::sync::Arc;

use parley_client::ChatBackend;
use parley_proto::{ChatId, ClientEvent, Participant, UserId};
use tokio::sync::mpsc;

use crate::{Driver, Session, SessionAction, SessionEvent, snapshot::load_snapshot};

/// Orchestrates one session against a driver and a chat backend.
pub struct Runtime<D, B>
where
    D: Driver,
    B: ChatBackend + ?Sized,
{
    driver: D,
    backend: Arc<B>,
    session: Session<D::Instant>,
    completions_tx: mpsc::UnboundedSender<SessionEvent<D::Instant>>,
    completions_rx: mpsc::UnboundedReceiver<SessionEvent<D::Instant>>,
}

impl<D, B> Runtime<D, B>
where
    D: Driver,
    B: ChatBackend + ?Sized + 'static,
{
    /// Create a runtime for the given authenticated participant.
    pub fn new(driver: D, backend: Arc<B>, me: Participant) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self { driver, backend, session: Session::new(me), completions_tx, completions_rx }
    }

    /// Run the session loop until logout.
    ///
    /// Loads the snapshot once up front, then cycles poll → handle →
    /// execute → drain completions → tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error. Backend and
    /// emission failures are folded into the session instead; none of them
    /// end the loop.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.load_initial_snapshot().await?;

        loop {
            if self.process_cycle().await? {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` once the session asked to shut down.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.dispatch(event).await?
        {
            return Ok(true);
        }

        while let Ok(event) = self.completions_rx.try_recv() {
            if self.dispatch(event).await? {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        self.dispatch(SessionEvent::Tick { now }).await
    }

    async fn dispatch(&mut self, event: SessionEvent<D::Instant>) -> Result<bool, D::Error> {
        let actions = self.session.handle(event);
        self.execute(actions).await
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                SessionAction::Render => self.driver.render(&self.session)?,
                SessionAction::Shutdown => return Ok(true),
                SessionAction::Emit(event) => self.emit(event).await?,
                SessionAction::FetchTranscript { chat_id } => self.spawn_transcript_fetch(chat_id),
                SessionAction::CreateChat { participant_id } => {
                    self.spawn_create_chat(participant_id);
                },
                SessionAction::CreateGroupChat { name, participant_ids } => {
                    self.spawn_create_group_chat(name, participant_ids);
                },
            }
        }
        Ok(false)
    }

    /// Emit an event, folding failures back into the session.
    ///
    /// Only `send_message` failures are surfaced to the user; a lost typing
    /// edge or read acknowledgment is logged and dropped.
    async fn emit(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        let surfaced = matches!(event, ClientEvent::SendMessage(_));
        let name = event.name();

        if let Err(error) = self.driver.emit(event).await {
            if surfaced {
                let actions =
                    self.session.handle(SessionEvent::SendFailed { reason: error.to_string() });
                for action in actions {
                    if matches!(action, SessionAction::Render) {
                        self.driver.render(&self.session)?;
                    }
                }
            } else {
                tracing::warn!(event = name, %error, "dropping failed background emission");
            }
        }
        Ok(())
    }

    async fn load_initial_snapshot(&mut self) -> Result<(), D::Error> {
        let me = self.session.me().id.clone();
        let event = match load_snapshot(self.backend.as_ref(), &me).await {
            Ok((chats, contacts)) => SessionEvent::SnapshotLoaded { chats, contacts },
            Err(error) => SessionEvent::SnapshotFailed { reason: error.to_string() },
        };
        let _ = self.dispatch(event).await?;
        Ok(())
    }

    fn spawn_transcript_fetch(&self, chat_id: ChatId) {
        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        drop(tokio::spawn(async move {
            let event = match backend.messages(&chat_id).await {
                Ok(messages) => SessionEvent::TranscriptLoaded { chat_id, messages },
                Err(error) => {
                    SessionEvent::TranscriptFailed { chat_id, reason: error.to_string() }
                },
            };
            let _ = tx.send(event);
        }));
    }

    fn spawn_create_chat(&self, participant_id: UserId) {
        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        drop(tokio::spawn(async move {
            let event = match backend.create_chat(&participant_id).await {
                Ok(chat) => SessionEvent::ChatCreated { chat },
                Err(error) => SessionEvent::ChatCreateFailed { reason: error.to_string() },
            };
            let _ = tx.send(event);
        }));
    }

    fn spawn_create_group_chat(&self, name: String, participant_ids: Vec<UserId>) {
        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        drop(tokio::spawn(async move {
            let event = match backend.create_group_chat(&name, &participant_ids).await {
                Ok(chat) => SessionEvent::ChatCreated { chat },
                Err(error) => SessionEvent::ChatCreateFailed { reason: error.to_string() },
            };
            let _ = tx.send(event);
        }));
    }

    /// Read access to the session.
    pub fn session(&self) -> &Session<D::Instant> {
        &self.session
    }
}
