//! Initial snapshot load.
//!
//! One-shot boundary operation per authenticated session: the chat list and
//! the contact list are fetched concurrently, and the caller is filtered out
//! of the contacts. Any failure is reported whole: the session keeps its
//! previous state and nothing retries automatically.

use parley_client::{BackendError, ChatBackend};
use parley_proto::{Chat, Participant};

/// Fetch the initial chat and contact lists for `me`.
pub async fn load_snapshot<B>(
    backend: &B,
    me: &str,
) -> Result<(Vec<Chat>, Vec<Participant>), BackendError>
where
    B: ChatBackend + ?Sized,
{
    let (chats, users) = tokio::join!(backend.list_chats(), backend.list_users());
    let chats = chats?;
    let mut contacts = users?;
    contacts.retain(|contact| contact.id != me);
    Ok((chats, contacts))
}
