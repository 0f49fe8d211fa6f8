//! Collaborator boundaries for the Parley chat client.
//!
//! The synchronizer core treats everything with its own source of truth as an
//! external collaborator behind a trait: the REST-style [`ChatBackend`], the
//! realtime [`Connection`] obtained from a [`TransportProvider`], and the
//! [`AuthService`] issuing credentials. Implementations own their transport
//! details (HTTP retries, socket reconnection); this crate only fixes the
//! contracts and the shared error taxonomy.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod auth;
mod backend;
mod memory;
mod transport;

pub use auth::{AuthError, AuthService, AuthSession, Credentials};
pub use backend::{BackendError, ChatBackend};
pub use memory::LocalConnection;
pub use transport::{
    Connection, ConnectionWatch, EventSubscription, TransportError, TransportProvider,
    event_channel,
};
