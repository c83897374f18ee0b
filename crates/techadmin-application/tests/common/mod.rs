//! In-memory backend standing in for the identity provider, the role table
//! and the catalogue service at once.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use techadmin_application::{AccessState, AdminConsole};
use techadmin_core::auth::{
    AuthUser, IdentityProvider, RoleRecord, RoleRepository, Session, SessionChange,
    SessionChangeReceiver,
};
use techadmin_core::error::{AdminError, Result};
use techadmin_core::technique::{
    CatalogueService, MutationRequest, SearchQuery, Technique, category_label,
};
use tokio::sync::broadcast;

pub const PASSWORD: &str = "open sesame";

struct Account {
    user_id: String,
    roles: Vec<String>,
}

pub struct InMemoryBackend {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
    techniques: Mutex<Vec<Technique>>,
    next_id: AtomicUsize,
    search_failures: Mutex<HashMap<usize, String>>,
    searches: Mutex<Vec<SearchQuery>>,
    mutations: Mutex<Vec<MutationRequest>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            changes,
            techniques: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            search_failures: Mutex::new(HashMap::new()),
            searches: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn add_account(&self, email: &str, roles: &[&str]) {
        let user_id = format!("user-{}", self.accounts.lock().unwrap().len() + 1);
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                user_id,
                roles: roles.iter().map(|role| role.to_string()).collect(),
            },
        );
    }

    /// Adds a technique and returns its id.
    pub fn seed(&self, name: &str, category: Option<&str>) -> String {
        let id = format!("tech-{:03}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.techniques.lock().unwrap().push(Technique {
            id: id.clone(),
            name: name.to_string(),
            aliases: Vec::new(),
            category: category.map(str::to_string),
            category_name: category.and_then(category_label).map(str::to_string),
            description: None,
            history: None,
            modern_usage: None,
            created_at: None,
        });
        id
    }

    pub fn seed_many(&self, count: usize) {
        for n in 0..count {
            self.seed(&format!("Technique {:03}", n), None);
        }
    }

    pub fn technique(&self, id: &str) -> Option<Technique> {
        self.techniques
            .lock()
            .unwrap()
            .iter()
            .find(|technique| technique.id == id)
            .cloned()
    }

    /// Makes the search at `offset` fail with `message`.
    pub fn fail_search_at(&self, offset: usize, message: &str) {
        self.search_failures
            .lock()
            .unwrap()
            .insert(offset, message.to_string());
    }

    pub fn searches(&self) -> Vec<SearchQuery> {
        self.searches.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<MutationRequest> {
        self.mutations.lock().unwrap().clone()
    }

    fn broadcast(&self, change: SessionChange) {
        *self.session.lock().unwrap() = change.session.clone();
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> SessionChangeReceiver {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, identifier: &str, secret: &str) -> Result<Session> {
        let user_id = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(identifier) {
                Some(account) if secret == PASSWORD => account.user_id.clone(),
                _ => return Err(AdminError::authentication("Invalid login credentials")),
            }
        };

        let session = Session {
            access_token: format!("token-{}", user_id),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: user_id,
                email: Some(identifier.to_string()),
            },
        };
        self.broadcast(SessionChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.broadcast(SessionChange::signed_out());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryBackend {
    async fn list_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .flat_map(|account| account.roles.iter().map(RoleRecord::new))
            .collect())
    }
}

#[async_trait]
impl CatalogueService for InMemoryBackend {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Technique>> {
        self.searches.lock().unwrap().push(query.clone());

        if let Some(message) = self.search_failures.lock().unwrap().get(&query.offset) {
            return Err(AdminError::service(500, message.clone()));
        }

        let needle = query.text.to_lowercase();
        let mut matches: Vec<Technique> = self
            .techniques
            .lock()
            .unwrap()
            .iter()
            .filter(|technique| {
                needle.is_empty()
                    || technique.name.to_lowercase().contains(&needle)
                    || technique
                        .aliases
                        .iter()
                        .any(|alias| alias.to_lowercase().contains(&needle))
            })
            .filter(|technique| {
                query.category.is_none() || technique.category == query.category
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn invoke_admin_mutation(&self, request: &MutationRequest) -> Result<()> {
        self.mutations.lock().unwrap().push(request.clone());
        let mut techniques = self.techniques.lock().unwrap();

        match request {
            MutationRequest::Insert(payload) => {
                let id = format!("tech-{:03}", self.next_id.fetch_add(1, Ordering::SeqCst));
                techniques.push(Technique {
                    id,
                    name: payload.name.clone(),
                    aliases: payload.aliases.clone(),
                    category: payload.category.clone(),
                    category_name: payload.category_name.clone(),
                    description: payload.description.clone(),
                    history: payload.history.clone(),
                    modern_usage: payload.modern_usage.clone(),
                    created_at: None,
                });
            }
            MutationRequest::Update(payload) => {
                let technique = techniques
                    .iter_mut()
                    .find(|technique| technique.id == payload.id)
                    .ok_or_else(|| AdminError::service(404, "Technique not found"))?;
                if let Some(name) = &payload.name {
                    technique.name = name.clone();
                }
                if let Some(aliases) = &payload.aliases {
                    technique.aliases = aliases.clone();
                }
                if let Some(category) = &payload.category {
                    technique.category = category.clone();
                }
                if let Some(category_name) = &payload.category_name {
                    technique.category_name = category_name.clone();
                }
                if let Some(description) = &payload.description {
                    technique.description = description.clone();
                }
                if let Some(history) = &payload.history {
                    technique.history = history.clone();
                }
                if let Some(modern_usage) = &payload.modern_usage {
                    technique.modern_usage = modern_usage.clone();
                }
            }
            MutationRequest::Remove(payload) => {
                let before = techniques.len();
                techniques.retain(|technique| technique.id != payload.id);
                if techniques.len() == before {
                    return Err(AdminError::service(404, "Technique not found"));
                }
            }
        }
        Ok(())
    }
}

pub async fn settle(console: &AdminConsole) -> AccessState {
    tokio::time::timeout(Duration::from_secs(1), console.wait_for_access())
        .await
        .expect("access state never settled")
}

/// Signs in and waits until the access state settles for that user.
pub async fn sign_in(console: &AdminConsole, email: &str) -> AccessState {
    console
        .sign_in(email, PASSWORD)
        .await
        .expect("sign-in rejected");
    tokio::time::timeout(
        Duration::from_secs(1),
        console.wait_for(|state| state.is_settled() && state.email() == Some(email)),
    )
    .await
    .expect("access state never settled")
}
