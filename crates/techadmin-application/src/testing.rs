//! Scripted collaborators shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::Mutex;

use async_trait::async_trait;
use techadmin_core::auth::{
    AuthUser, IdentityProvider, RoleRecord, RoleRepository, Session, SessionChange,
    SessionChangeReceiver,
};
use techadmin_core::error::{AdminError, Result};
use techadmin_core::technique::{CatalogueService, MutationRequest, SearchQuery, Technique};
use tokio::sync::{broadcast, oneshot};

pub fn session_for(user_id: &str, email: &str) -> Session {
    Session {
        access_token: format!("token-{}", user_id),
        refresh_token: None,
        expires_at: None,
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(email.to_string()),
        },
    }
}

/// Techniques with ids `{prefix}-{n}` for every `n` in `range`.
pub fn techniques(prefix: &str, range: Range<usize>) -> Vec<Technique> {
    range
        .map(|n| Technique {
            id: format!("{}-{}", prefix, n),
            name: format!("{} {}", prefix, n),
            aliases: Vec::new(),
            category: None,
            category_name: None,
            description: None,
            history: None,
            modern_usage: None,
            created_at: None,
        })
        .collect()
}

enum Scripted<T> {
    Ready(Result<T>),
    Gated(oneshot::Receiver<Result<T>>),
}

async fn open_gate<T>(gate: oneshot::Receiver<Result<T>>) -> Result<T> {
    gate.await
        .unwrap_or_else(|_| Err(AdminError::internal("gate dropped")))
}

// ============================================================================
// Identity
// ============================================================================

pub struct MockIdentity {
    changes: broadcast::Sender<SessionChange>,
    restore: Mutex<Scripted<Option<Session>>>,
}

impl MockIdentity {
    pub const PASSWORD: &'static str = "correct horse";

    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            changes,
            restore: Mutex::new(Scripted::Ready(Ok(None))),
        }
    }

    pub fn set_restored(&self, session: Option<Session>) {
        *self.restore.lock().unwrap() = Scripted::Ready(Ok(session));
    }

    pub fn fail_restore(&self, message: &str) {
        *self.restore.lock().unwrap() = Scripted::Ready(Err(AdminError::transport(message)));
    }

    /// Holds the restore open until the returned sender fires.
    pub fn gate_restore(&self) -> oneshot::Sender<Result<Option<Session>>> {
        let (tx, rx) = oneshot::channel();
        *self.restore.lock().unwrap() = Scripted::Gated(rx);
        tx
    }

    pub fn emit(&self, change: SessionChange) {
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn current_session(&self) -> Result<Option<Session>> {
        let gate = {
            let mut restore = self.restore.lock().unwrap();
            if let Scripted::Ready(result) = &*restore {
                return result.clone();
            }
            match std::mem::replace(&mut *restore, Scripted::Ready(Ok(None))) {
                Scripted::Gated(gate) => gate,
                Scripted::Ready(_) => unreachable!(),
            }
        };
        open_gate(gate).await
    }

    fn subscribe(&self) -> SessionChangeReceiver {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, identifier: &str, secret: &str) -> Result<Session> {
        if secret != Self::PASSWORD {
            return Err(AdminError::authentication("Invalid login credentials"));
        }
        let session = session_for(identifier, identifier);
        self.emit(SessionChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.emit(SessionChange::signed_out());
        Ok(())
    }
}

// ============================================================================
// Roles
// ============================================================================

pub struct MockRoles {
    scripts: Mutex<HashMap<String, Scripted<Vec<RoleRecord>>>>,
    lookups: Mutex<Vec<String>>,
}

impl MockRoles {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    fn script(&self, user_id: &str, script: Scripted<Vec<RoleRecord>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(user_id.to_string(), script);
    }

    pub fn grant(&self, user_id: &str, roles: &[&str]) {
        let records = roles.iter().map(|role| RoleRecord::new(*role)).collect();
        self.script(user_id, Scripted::Ready(Ok(records)));
    }

    pub fn fail(&self, user_id: &str, message: &str) {
        self.script(
            user_id,
            Scripted::Ready(Err(AdminError::service(403, message))),
        );
    }

    /// Holds the next lookup for `user_id` open until the sender fires.
    pub fn gate(&self, user_id: &str) -> oneshot::Sender<Result<Vec<RoleRecord>>> {
        let (tx, rx) = oneshot::channel();
        self.script(user_id, Scripted::Gated(rx));
        tx
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleRepository for MockRoles {
    async fn list_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>> {
        self.lookups.lock().unwrap().push(user_id.to_string());

        let gate = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get(user_id) {
                None => return Ok(Vec::new()),
                Some(Scripted::Ready(result)) => return result.clone(),
                Some(Scripted::Gated(_)) => {}
            }
            match scripts.remove(user_id) {
                Some(Scripted::Gated(gate)) => gate,
                _ => unreachable!(),
            }
        };
        open_gate(gate).await
    }
}

// ============================================================================
// Catalogue
// ============================================================================

pub struct MockCatalogue {
    pages: Mutex<VecDeque<Scripted<Vec<Technique>>>>,
    queries: Mutex<Vec<SearchQuery>>,
    mutation_results: Mutex<VecDeque<Result<()>>>,
    mutations: Mutex<Vec<MutationRequest>>,
}

impl MockCatalogue {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            mutation_results: Mutex::new(VecDeque::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn push_page(&self, page: Vec<Technique>) {
        self.pages.lock().unwrap().push_back(Scripted::Ready(Ok(page)));
    }

    pub fn push_error(&self, message: &str) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Err(AdminError::service(503, message))));
    }

    /// Queues a page that resolves only when the returned sender fires.
    pub fn push_gated(&self) -> oneshot::Sender<Result<Vec<Technique>>> {
        let (tx, rx) = oneshot::channel();
        self.pages.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn fail_next_mutation(&self, error: AdminError) {
        self.mutation_results.lock().unwrap().push_back(Err(error));
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<MutationRequest> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogueService for MockCatalogue {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Technique>> {
        self.queries.lock().unwrap().push(query.clone());

        let next = self.pages.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Gated(gate)) => open_gate(gate).await,
            None => Ok(Vec::new()),
        }
    }

    async fn invoke_admin_mutation(&self, request: &MutationRequest) -> Result<()> {
        self.mutations.lock().unwrap().push(request.clone());
        self.mutation_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
