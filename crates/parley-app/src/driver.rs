//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] decouples the session runtime from specific I/O: a
//! production frontend funnels UI intents and decoded transport events
//! through [`Driver::poll_event`], while a simulation driver replays scripted
//! events under virtual time. The same [`crate::Runtime`] orchestration runs
//! against either.

use std::{future::Future, ops::Sub, time::Duration};

use parley_proto::ClientEvent;

use crate::{Session, SessionEvent};

/// Abstracts I/O operations for the session runtime.
///
/// `poll_event` is the single funnel for UI intents and transport-inbound
/// events; delivering everything through one polling point is what keeps
/// session mutation serialized ("one handler completes before the next
/// begins") even on a concurrent runtime.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + 'static + Sub<Output = Duration>;

    /// Poll for the next input event.
    ///
    /// Returns `None` when no event is ready; the runtime then runs its
    /// housekeeping tick and polls again.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionEvent<Self::Instant>>, Self::Error>> + Send;

    /// Emit a named event on the realtime connection.
    fn emit(&mut self, event: ClientEvent) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether the realtime connection is currently up.
    fn is_connected(&self) -> bool;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the observable session state.
    fn render(&mut self, session: &Session<Self::Instant>) -> Result<(), Self::Error>;

    /// Release the connection and any subscriptions.
    fn stop(&mut self);
}
