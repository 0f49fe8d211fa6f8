//! Auth service boundary.
//!
//! Credential issuance and session storage are entirely the collaborator's
//! business; the synchronizer only needs the authenticated participant and a
//! token to hand to the transport.

use parley_proto::Participant;
use thiserror::Error;

/// Opaque bearer token handed to the transport on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token issued at login.
    pub token: String,
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Credentials for subsequent backend and transport calls.
    pub credentials: Credentials,
    /// The logged-in participant.
    pub user: Participant,
}

/// Errors from the auth boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email/password pair rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token no longer accepted; the caller must log in again.
    #[error("session expired")]
    SessionExpired,

    /// Request never completed.
    #[error("network error: {0}")]
    Network(String),
}

/// Credential issuance and session lookup.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange an email/password pair for a session.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Register a new participant and log them in.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// The participant the stored token belongs to.
    async fn current_user(&self) -> Result<Participant, AuthError>;

    /// Whether a session is currently held.
    fn authenticated(&self) -> bool;
}
