//! Session store.
//!
//! Owns the current session. The store listens to the identity provider's
//! change stream for its whole lifetime and publishes every change through
//! a `watch` channel so other components can react to it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use techadmin_core::auth::{AuthEvent, IdentityProvider, Session, SessionChange, SessionChangeReceiver};
use techadmin_core::error::{AdminError, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Published session state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    /// True until the startup restore has resolved
    pub loading: bool,
    /// What produced the current session value
    pub last_event: Option<AuthEvent>,
}

impl AuthSnapshot {
    fn loading() -> Self {
        Self {
            session: None,
            loading: true,
            last_event: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(Session::user_id)
    }

    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::email)
    }
}

struct StoreInner {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthSnapshot>,
    alive: AtomicBool,
    bootstrapped: AtomicBool,
    /// Bumped on every applied change notification
    change_generation: AtomicU64,
}

impl StoreInner {
    fn apply_change(&self, change: SessionChange) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        tracing::debug!(
            "[SessionStore] session change: event={:?}, user={:?}",
            change.event,
            change.session.as_ref().map(Session::user_id)
        );

        self.change_generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.session = change.session;
            state.last_event = Some(change.event);
        });
    }
}

/// Tracks the authenticated session and the startup loading flag.
pub struct SessionStore {
    inner: Arc<StoreInner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Creates the store and subscribes to the provider's change stream.
    ///
    /// Must be called from within a tokio runtime. The store starts in the
    /// loading state; call [`SessionStore::bootstrap`] to restore a session.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::loading());
        let changes = provider.subscribe();
        let inner = Arc::new(StoreInner {
            provider,
            state,
            alive: AtomicBool::new(true),
            bootstrapped: AtomicBool::new(false),
            change_generation: AtomicU64::new(0),
        });

        let listener = tokio::spawn(Self::listen(Arc::clone(&inner), changes));

        Self {
            inner,
            listener: Mutex::new(Some(listener)),
        }
    }

    async fn listen(inner: Arc<StoreInner>, mut changes: SessionChangeReceiver) {
        loop {
            match changes.recv().await {
                Ok(change) => inner.apply_change(change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "[SessionStore] listener lagged, {} session changes skipped",
                        skipped
                    );
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("[SessionStore] session change stream closed");
                    break;
                }
            }
        }
    }

    /// Restores an existing session from the identity provider.
    ///
    /// Runs once; later calls return immediately. The loading flag is
    /// cleared when the restore resolves, even if it fails. A change
    /// notification that arrived while the restore was pending wins over
    /// the restored value.
    pub async fn bootstrap(&self) {
        if self.inner.bootstrapped.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.inner.change_generation.load(Ordering::SeqCst);
        self.inner.state.send_modify(|state| state.loading = true);

        let restored = self.inner.provider.current_session().await;

        if !self.inner.alive.load(Ordering::SeqCst) {
            tracing::debug!("[SessionStore] bootstrap resolved after teardown, ignoring");
            return;
        }

        let restored = match restored {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("[SessionStore] failed to restore session: {}", err);
                None
            }
        };

        let superseded = self.inner.change_generation.load(Ordering::SeqCst) != generation;
        if superseded {
            tracing::debug!("[SessionStore] restored session superseded by a change notification");
        }

        self.inner.state.send_modify(|state| {
            if !superseded {
                state.session = restored;
                state.last_event = Some(AuthEvent::InitialSession);
            }
            state.loading = false;
        });
    }

    /// Signs in through the identity provider.
    ///
    /// The session itself arrives through the change stream.
    ///
    /// # Errors
    ///
    /// Always `AdminError::Authentication` with a message fit for display.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<()> {
        match self
            .inner
            .provider
            .sign_in_with_password(identifier, secret)
            .await
        {
            Ok(session) => {
                tracing::info!("[SessionStore] signed in as {}", session.user_id());
                Ok(())
            }
            Err(err) => {
                tracing::info!("[SessionStore] sign-in rejected: {}", err);
                Err(AdminError::authentication(err.user_message("Sign-in failed")))
            }
        }
    }

    /// Signs out; the session becomes absent through the change stream.
    pub async fn sign_out(&self) -> Result<()> {
        self.inner.provider.sign_out().await.inspect_err(|err| {
            tracing::warn!("[SessionStore] sign-out failed: {}", err);
        })?;
        tracing::info!("[SessionStore] signed out");
        Ok(())
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Observes every published change of the session state.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    /// Stops listening and disables any bootstrap still in flight.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        if let Ok(mut listener) = self.listener.lock()
            && let Some(handle) = listener.take()
        {
            handle.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
