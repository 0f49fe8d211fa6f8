//! Wire data model for Parley.
//!
//! Types in this crate mirror the JSON shapes spoken by the chat backend and
//! the realtime transport exactly (`_id`, `chatId`, `isTyping`, ...). Both
//! collaborators denormalize records inconsistently (most notably a message
//! sender arrives either as a bare id or an expanded participant record), so
//! the normalization lives here, next to the serde definitions.
//!
//! # Components
//!
//! - [`Participant`], [`Chat`], [`ChatMessage`]: backend records.
//! - [`ServerEvent`], [`ClientEvent`]: named realtime event envelopes.
//! - [`WireError`]: decoding/encoding failures at the boundary.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod event;
mod model;

pub use event::{
    ClientEvent, ReadMessagePayload, SendMessagePayload, ServerEvent, TypingPayload,
    UserStatusPayload, WireError,
};
pub use model::{Chat, ChatId, ChatMessage, MessageId, Participant, Presence, SenderRef, UserId};
