//! Shared HTTP plumbing for the REST backend.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use techadmin_core::auth::{AuthEvent, Session, SessionChange};
use techadmin_core::config::{CatalogueConfig, RootConfig};
use techadmin_core::error::{AdminError, Result};
use tokio::sync::{Mutex, broadcast};

use crate::storage::SessionFile;

/// Sessions this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 30;

const CHANGE_CAPACITY: usize = 16;

/// Connection settings resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RestSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub catalogue: CatalogueConfig,
}

impl RestSettings {
    /// # Errors
    ///
    /// Returns `AdminError::Config` when no backend URL is configured.
    pub fn from_config(config: &RootConfig) -> Result<Self> {
        let base_url = config
            .backend
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AdminError::config(
                    "backend.url is not set (config.toml or TECHADMIN_API_URL)",
                )
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config
                .backend
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(config.backend.timeout_secs.max(1)),
            catalogue: config.catalogue.clone(),
        })
    }
}

/// REST client for the hosted backend.
///
/// Implements the identity provider, the role repository and the
/// catalogue service over a single HTTP client and a single session.
pub struct RestBackend {
    pub(super) client: Client,
    pub(super) settings: RestSettings,
    session: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
    /// Held while a refresh grant is in flight
    refreshing: Mutex<()>,
    pub(super) store: Option<SessionFile>,
}

impl RestBackend {
    pub fn new(settings: RestSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(transport_error)?;
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Ok(Self {
            client,
            settings,
            session: RwLock::new(None),
            changes,
            refreshing: Mutex::new(()),
            store: None,
        })
    }

    /// Persists the session to `store` and restores it from there.
    pub fn with_session_file(mut self, store: SessionFile) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &RestSettings {
        &self.settings
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url, path.trim_start_matches('/'))
    }

    /// A request carrying the API key and `bearer` (or the API key) as
    /// authorization.
    pub(super) fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(api_key) = &self.settings.api_key {
            request = request.header("apikey", api_key);
        }
        if let Some(token) = bearer.or(self.settings.api_key.as_deref()) {
            request = request.bearer_auth(token);
        }
        request
    }

    pub(super) fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn subscribe_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    /// Replaces the in-memory session and mirrors it to the session file.
    pub(super) fn remember(&self, session: Option<Session>) {
        if let Some(store) = &self.store {
            let persisted = match &session {
                Some(session) => store.save(session),
                None => store.clear(),
            };
            if let Err(err) = persisted {
                tracing::warn!("[RestBackend] failed to persist session: {}", err);
            }
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Remembers `session` and notifies subscribers.
    pub(super) fn publish(&self, event: AuthEvent, session: Option<Session>) {
        self.remember(session.clone());
        // No subscribers is fine.
        let _ = self.changes.send(SessionChange { event, session });
    }

    /// Access token for data requests, refreshing an expiring session.
    ///
    /// Refreshes are serialized: a caller that waited for another refresh
    /// uses the session it produced instead of spending the same refresh
    /// token twice.
    pub(super) async fn bearer(&self) -> Result<Option<String>> {
        if let Some(token) = self.usable_token() {
            return Ok(token);
        }

        let _refreshing = self.refreshing.lock().await;
        if let Some(token) = self.usable_token() {
            return Ok(token);
        }
        let Some(session) = self.current() else {
            return Ok(None);
        };
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Ok(Some(session.access_token));
        };

        tracing::debug!("[RestBackend] refreshing session for {}", session.user_id());
        let fresh = self.refresh(refresh_token).await?;
        let token = fresh.access_token.clone();
        self.publish(AuthEvent::TokenRefreshed, Some(fresh));
        Ok(Some(token))
    }

    /// The token to send as-is, or `None` if the session needs a refresh.
    fn usable_token(&self) -> Option<Option<String>> {
        let Some(session) = self.current() else {
            return Some(None);
        };

        let deadline = Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS);
        if session.refresh_token.is_none() || !session.is_expired(deadline) {
            Some(Some(session.access_token))
        } else {
            None
        }
    }
}

// ============================================================================
// Response handling
// ============================================================================

pub(super) fn transport_error(err: reqwest::Error) -> AdminError {
    AdminError::transport(err.to_string())
}

/// Fails with the service's own message on a non-success status.
pub(super) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AdminError::service(status.as_u16(), error_message(&body)))
}

pub(super) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = check(request.send().await.map_err(transport_error)?).await?;
    let body = response.text().await.map_err(transport_error)?;
    Ok(serde_json::from_str(&body)?)
}

pub(super) async fn send_empty(request: RequestBuilder) -> Result<()> {
    check(request.send().await.map_err(transport_error)?).await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Picks the human-readable message out of an error response body.
///
/// Returns an empty string when the body carries nothing usable.
pub(super) fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };

    let nested = match &parsed.error {
        Some(serde_json::Value::String(error)) => Some(error.clone()),
        Some(serde_json::Value::Object(error)) => error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    [parsed.error_description, parsed.msg, parsed.message, nested]
        .into_iter()
        .flatten()
        .find(|message| !message.trim().is_empty())
        .unwrap_or_default()
}
