//! Role resolver.
//!
//! Keeps the role set of the signed-in user. Every change of user identity
//! starts a new lookup generation; results belonging to an older generation
//! are dropped when they arrive.

use std::sync::{Arc, Mutex};

use techadmin_core::auth::{RoleRepository, RoleSet};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session_store::AuthSnapshot;

/// Published role state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleState {
    /// The identity the current role set belongs to
    pub user_id: Option<String>,
    pub roles: RoleSet,
    /// A lookup for `user_id` is in flight
    pub resolving: bool,
    pub(crate) generation: u64,
}

impl RoleState {
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

struct ResolverInner {
    repository: Arc<dyn RoleRepository>,
    state: watch::Sender<RoleState>,
}

impl ResolverInner {
    /// Switches to `user_id`, discarding the previous role set.
    ///
    /// Returns the generation tag for the lookup that must follow, or
    /// `None` when there is nobody to look up.
    fn begin(&self, user_id: Option<String>) -> Option<(u64, String)> {
        let mut lookup = None;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.roles = RoleSet::empty();
            state.resolving = user_id.is_some();
            state.user_id = user_id.clone();
            lookup = user_id.map(|id| (state.generation, id));
        });
        lookup
    }

    async fn finish(&self, generation: u64, user_id: String) {
        let roles = match self.repository.list_roles(&user_id).await {
            Ok(records) => records.into_iter().collect::<RoleSet>(),
            Err(err) => {
                tracing::error!("[RoleResolver] failed to load roles for {}: {}", user_id, err);
                RoleSet::empty()
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.roles = roles;
            state.resolving = false;
            true
        });

        if applied {
            tracing::debug!("[RoleResolver] roles resolved for {}", user_id);
        } else {
            tracing::debug!("[RoleResolver] discarding stale roles for {}", user_id);
        }
    }

    async fn resolve(&self, user_id: Option<String>) {
        if let Some((generation, user_id)) = self.begin(user_id) {
            self.finish(generation, user_id).await;
        }
    }
}

/// Resolves and publishes the authorization roles of the current user.
pub struct RoleResolver {
    inner: Arc<ResolverInner>,
    tracker: Mutex<Option<JoinHandle<()>>>,
}

impl RoleResolver {
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        let (state, _) = watch::channel(RoleState::default());
        Self {
            inner: Arc::new(ResolverInner { repository, state }),
            tracker: Mutex::new(None),
        }
    }

    /// Replaces the role set for `user_id` and waits for the lookup.
    ///
    /// `None` empties the role set without a lookup.
    pub async fn resolve(&self, user_id: Option<String>) {
        self.inner.resolve(user_id).await;
    }

    /// Follows the user identity published by a session store.
    ///
    /// A lookup starts whenever the identity differs from the last one seen,
    /// including the initial value. Lookups run as their own tasks so a
    /// newer identity never waits for an older lookup. Must be called from
    /// within a tokio runtime.
    pub fn track(&self, mut sessions: watch::Receiver<AuthSnapshot>) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut last_key: Option<Option<String>> = None;
            loop {
                let key = sessions.borrow_and_update().user_id().map(str::to_string);
                if last_key.as_ref() != Some(&key) {
                    last_key = Some(key.clone());
                    if let Some((generation, user_id)) = inner.begin(key) {
                        let lookup = Arc::clone(&inner);
                        tokio::spawn(async move { lookup.finish(generation, user_id).await });
                    }
                }

                if sessions.changed().await.is_err() {
                    break;
                }
            }
        });

        if let Ok(mut tracker) = self.tracker.lock()
            && let Some(previous) = tracker.replace(handle)
        {
            previous.abort();
        }
    }

    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().is_admin()
    }

    pub fn roles(&self) -> RoleSet {
        self.inner.state.borrow().roles.clone()
    }

    pub fn snapshot(&self) -> RoleState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.inner.state.subscribe()
    }

    /// Stops following the session store.
    pub fn shutdown(&self) {
        if let Ok(mut tracker) = self.tracker.lock()
            && let Some(handle) = tracker.take()
        {
            handle.abort();
        }
    }
}

impl Drop for RoleResolver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
