//! In-process connection for tests and simulation.

use std::sync::{Mutex, PoisonError};

use parley_proto::{ClientEvent, ServerEvent};
use tokio::sync::{mpsc, watch};

use crate::transport::{
    Connection, ConnectionWatch, EventSubscription, TransportError, event_channel,
};

/// Loopback [`Connection`] backed by channels.
///
/// Inbound events are injected by the test driving the session; outbound
/// events are recorded for inspection. Connectivity can be toggled to
/// exercise disconnected-send paths.
#[derive(Debug)]
pub struct LocalConnection {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ServerEvent>>>,
    sent: Mutex<Vec<ClientEvent>>,
    connected: watch::Sender<bool>,
}

impl Default for LocalConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalConnection {
    /// Create a connected loopback connection.
    pub fn new() -> Self {
        let (connected, _) = watch::channel(true);
        Self { subscribers: Mutex::new(Vec::new()), sent: Mutex::new(Vec::new()), connected }
    }

    /// Deliver a server event to every live subscription.
    pub fn inject(&self, event: &ServerEvent) {
        let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Flip the connected flag, notifying watchers.
    pub fn set_connected(&self, up: bool) {
        // `send` fails (and leaves the value untouched) when no watchers
        // exist; `send_replace` updates unconditionally.
        let _ = self.connected.send_replace(up);
    }

    /// Drain everything emitted so far.
    pub fn take_sent(&self) -> Vec<ClientEvent> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of events emitted so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Connection for LocalConnection {
    fn emit(&self, event: ClientEvent) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        // Encode up front so malformed payloads fail here, as a real socket
        // implementation would.
        event.to_payload()?;
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(event);
        Ok(())
    }

    fn subscribe(&self) -> EventSubscription {
        let (tx, sub) = event_channel();
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        sub
    }

    fn connection_changes(&self) -> ConnectionWatch {
        ConnectionWatch::new(self.connected.subscribe())
    }

    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}
