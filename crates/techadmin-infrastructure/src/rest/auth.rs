//! Password sign-in, token refresh and sign-out against the auth API.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use techadmin_core::auth::{AuthEvent, AuthUser, IdentityProvider, Session, SessionChangeReceiver};
use techadmin_core::error::{AdminError, Result};

use super::client::{RestBackend, send_empty, send_json};

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    expires_in: Option<i64>,
    /// Absolute expiry as a unix timestamp
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    pub(super) fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|timestamp| Utc.timestamp_opt(timestamp, 0).single())
            .or_else(|| {
                self.expires_in
                    .map(|seconds| now + chrono::Duration::seconds(seconds))
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

impl RestBackend {
    pub(super) async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token });

        let token: TokenResponse = send_json(request).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Loads the stored session, refreshing it if it has expired.
    async fn restore(&self) -> Result<Option<Session>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(stored) = store.load() else {
            return Ok(None);
        };

        if !stored.is_expired(Utc::now()) {
            tracing::debug!("[RestBackend] restored session for {}", stored.user_id());
            self.remember(Some(stored.clone()));
            return Ok(Some(stored));
        }

        let Some(refresh_token) = stored.refresh_token.as_deref() else {
            tracing::debug!("[RestBackend] stored session expired without refresh token");
            self.remember(None);
            return Ok(None);
        };

        match self.refresh(refresh_token).await {
            Ok(fresh) => {
                tracing::debug!("[RestBackend] refreshed stored session for {}", fresh.user_id());
                self.remember(Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(err @ AdminError::Service { .. }) => {
                tracing::info!("[RestBackend] stored session rejected: {}", err);
                self.remember(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        if let Some(session) = self.current() {
            return Ok(Some(session));
        }
        self.restore().await
    }

    fn subscribe(&self) -> SessionChangeReceiver {
        self.subscribe_changes()
    }

    async fn sign_in_with_password(&self, identifier: &str, secret: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email: identifier,
                password: secret,
            });

        let token: TokenResponse = match send_json(request).await {
            Ok(token) => token,
            Err(AdminError::Service { status, message }) if (400..500).contains(&status) => {
                return Err(AdminError::authentication(message));
            }
            Err(err) => return Err(err),
        };

        let session = token.into_session(Utc::now());
        tracing::info!("[RestBackend] signed in as {}", session.user_id());
        self.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Revokes the session remotely and forgets it locally.
    ///
    /// The local session is dropped even if the remote call fails.
    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.current() {
            let request = self.request(Method::POST, "auth/v1/logout", Some(&session.access_token));
            if let Err(err) = send_empty(request).await {
                tracing::warn!("[RestBackend] remote sign-out failed: {}", err);
            }
        }

        self.publish(AuthEvent::SignedOut, None);
        Ok(())
    }
}
