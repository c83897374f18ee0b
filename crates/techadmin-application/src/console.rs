//! Admin console: wires session, roles and the technique panel together.
//!
//! The console is the only place the three collaborators meet. Session
//! state drives role resolution, and the combination of both decides
//! whether the technique panel is reachable at all.

use std::sync::{Arc, Mutex};

use techadmin_core::auth::{IdentityProvider, RoleRepository};
use techadmin_core::error::Result;
use techadmin_core::technique::CatalogueService;

use crate::access::{AccessState, access_state};
use crate::role_resolver::RoleResolver;
use crate::session_store::SessionStore;
use crate::technique::TechniquePanel;

pub struct AdminConsole {
    sessions: SessionStore,
    roles: RoleResolver,
    catalogue: Arc<dyn CatalogueService>,
    page_size: usize,
    /// Panel of the admin it was opened for
    panel: Mutex<Option<(String, Arc<TechniquePanel>)>>,
}

impl AdminConsole {
    /// Creates the console and starts following session changes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleRepository>,
        catalogue: Arc<dyn CatalogueService>,
        page_size: usize,
    ) -> Self {
        let sessions = SessionStore::new(identity);
        let resolver = RoleResolver::new(roles);
        resolver.track(sessions.subscribe());

        Self {
            sessions,
            roles: resolver,
            catalogue,
            page_size,
            panel: Mutex::new(None),
        }
    }

    /// Restores a previous session, if the identity provider has one.
    pub async fn start(&self) {
        self.sessions.bootstrap().await;
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    pub fn access(&self) -> AccessState {
        access_state(&self.sessions.snapshot(), &self.roles.snapshot())
    }

    /// Waits until the access state satisfies `predicate`.
    ///
    /// Returns the last observed state early if either source goes away.
    pub async fn wait_for<F>(&self, predicate: F) -> AccessState
    where
        F: Fn(&AccessState) -> bool,
    {
        let mut auth = self.sessions.subscribe();
        let mut roles = self.roles.subscribe();

        loop {
            let state = access_state(&auth.borrow_and_update(), &roles.borrow_and_update());
            if predicate(&state) {
                return state;
            }

            let changed = tokio::select! {
                changed = auth.changed() => changed,
                changed = roles.changed() => changed,
            };
            if changed.is_err() {
                return state;
            }
        }
    }

    /// Waits until the access state no longer changes on its own.
    pub async fn wait_for_access(&self) -> AccessState {
        self.wait_for(AccessState::is_settled).await
    }

    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<()> {
        self.sessions.sign_in(identifier, secret).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.sessions.sign_out().await
    }

    /// The technique panel, available only to a signed-in admin.
    ///
    /// A different admin identity gets a fresh panel.
    pub fn techniques(&self) -> Option<Arc<TechniquePanel>> {
        let admin = if self.access().is_admin() {
            self.sessions.snapshot().user_id().map(str::to_string)
        } else {
            None
        };

        let Ok(mut panel) = self.panel.lock() else {
            return None;
        };

        let Some(user_id) = admin else {
            if panel.take().is_some() {
                tracing::debug!("[AdminConsole] technique panel closed");
            }
            return None;
        };

        if let Some((owner, existing)) = panel.as_ref()
            && *owner == user_id
        {
            return Some(Arc::clone(existing));
        }

        tracing::debug!("[AdminConsole] opening technique panel for {}", user_id);
        let fresh = Arc::new(TechniquePanel::new(
            Arc::clone(&self.catalogue),
            self.page_size,
        ));
        *panel = Some((user_id, Arc::clone(&fresh)));
        Some(fresh)
    }

    pub fn shutdown(&self) {
        self.sessions.shutdown();
        self.roles.shutdown();
    }
}
