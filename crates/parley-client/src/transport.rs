//! Realtime transport boundary.
//!
//! A [`TransportProvider`] establishes one [`Connection`] per authenticated
//! session. The connection is a thin pipe: named events out via
//! [`Connection::emit`], named events in via an [`EventSubscription`] handle.
//! Subscription handles release their registration deterministically when
//! dropped; reconnection policy stays inside the provider.

use parley_proto::{ClientEvent, ServerEvent, WireError};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::auth::Credentials;

/// Errors from the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake with the realtime server failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Emission attempted without an established connection.
    #[error("not connected")]
    NotConnected,

    /// Connection was up but the emission itself failed.
    #[error("emit failed: {0}")]
    Emit(String),

    /// Payload could not be encoded for the wire.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Receiving half of the inbound event stream.
///
/// Dropping the handle closes the channel, which the connection observes as
/// an unsubscribe.
#[derive(Debug)]
pub struct EventSubscription {
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl EventSubscription {
    /// Wait for the next inbound event. `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<ServerEvent> {
        self.rx.recv().await
    }

    /// Take an inbound event without waiting. `None` if nothing is queued.
    pub fn try_next(&mut self) -> Option<ServerEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a linked publisher/subscription pair.
///
/// Connection implementations keep the sender and hand out the subscription.
pub fn event_channel() -> (mpsc::UnboundedSender<ServerEvent>, EventSubscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, EventSubscription { rx })
}

/// Watch handle for connection up/down transitions.
#[derive(Debug, Clone)]
pub struct ConnectionWatch {
    rx: watch::Receiver<bool>,
}

impl ConnectionWatch {
    /// Wrap a watch receiver carrying the connected flag.
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Current connected flag.
    pub fn connected(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the flag to change and return its new value. `None` once the
    /// connection has been torn down.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow())
    }
}

/// An established realtime connection.
pub trait Connection: Send + Sync {
    /// Emit a named event to the server.
    ///
    /// Fire-and-forget: delivery is the transport's business. Fails if the
    /// connection is down or the payload cannot be encoded.
    fn emit(&self, event: ClientEvent) -> Result<(), TransportError>;

    /// Subscribe to the inbound event stream.
    fn subscribe(&self) -> EventSubscription;

    /// Watch connection up/down transitions.
    fn connection_changes(&self) -> ConnectionWatch;

    /// Whether the connection is currently up.
    fn is_connected(&self) -> bool;
}

/// Establishes realtime connections for authenticated sessions.
#[async_trait::async_trait]
pub trait TransportProvider: Send + Sync {
    /// Concrete connection type produced by this provider.
    type Conn: Connection;

    /// Perform the handshake and return a live connection.
    async fn connect(&self, credentials: &Credentials) -> Result<Self::Conn, TransportError>;
}
