//! Conversation-state synchronizer for Parley.
//!
//! Pure state machine plus a generic runtime, reconciling two sources of
//! truth (on-demand backend snapshots and the push event stream) into one
//! authoritative view of a participant's conversations, enabling
//! deterministic testing with the same code that runs in production.
//!
//! # Components
//!
//! - [`Session`]: the state machine folding events into conversations,
//!   transcripts, unread counters, typing and presence state.
//! - [`TypingCoordinator`]: trailing-edge debounce for the local typing
//!   indicator.
//! - [`load_snapshot`]: one-shot initial load through the chat backend.
//! - [`Driver`]: platform I/O abstraction.
//! - [`Runtime`]: orchestration loop tying the above together.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod driver;
mod event;
mod runtime;
mod session;
mod snapshot;
mod state;
mod typing;

pub use action::SessionAction;
pub use driver::Driver;
pub use event::SessionEvent;
pub use runtime::Runtime;
pub use session::Session;
pub use snapshot::load_snapshot;
pub use state::{ConnectionState, Selection};
pub use typing::{TYPING_DEBOUNCE, TypingCoordinator};
