//! Identity provider trait.
//!
//! Defines the interface to the remote service that issues sessions.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::model::{Session, SessionChange};
use crate::error::Result;

/// Receiving end of a session-change subscription.
///
/// Dropping the receiver is the unsubscribe operation.
pub type SessionChangeReceiver = broadcast::Receiver<SessionChange>;

/// An abstract identity provider.
///
/// Implementations own session persistence (for silent restore) and
/// broadcast a [`SessionChange`] every time the session is created,
/// refreshed or destroyed.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the session restored from the provider's own storage, if any.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: A previous session is still valid
    /// - `Ok(None)`: Nobody is signed in
    /// - `Err(_)`: The provider could not be reached
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Subscribes to session-change notifications.
    ///
    /// Every notification sent after this call is delivered to the returned
    /// receiver, in order.
    fn subscribe(&self) -> SessionChangeReceiver;

    /// Signs in with an identifier (email) and a secret (password).
    ///
    /// On success the provider broadcasts a `SignedIn` change; callers should
    /// not apply the returned session themselves.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Authentication` carrying the provider's message
    /// when the credentials are rejected.
    async fn sign_in_with_password(&self, identifier: &str, secret: &str) -> Result<Session>;

    /// Signs the current user out and broadcasts a `SignedOut` change.
    async fn sign_out(&self) -> Result<()>;
}
