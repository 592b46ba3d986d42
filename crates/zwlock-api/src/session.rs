// Gateway session management
//
// Cookie-based ZAutomation sessions. A session token is restored from the
// token store when possible (and probed against `status`), otherwise a fresh
// login is performed. The token travels on every request as both the
// `ZWAYSession` cookie and the `ZWAYSession` header.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{ApiBase, authorize, endpoint};
use crate::error::Error;
use crate::models::LoginResponse;
use crate::token_store::TokenStore;

/// Name of the session cookie and of the mirrored request header.
pub const SESSION_COOKIE: &str = "ZWAYSession";

/// Gateway login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Owns the session token lifecycle: restore, validate, login, persist.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    store: TokenStore,
    session: Mutex<Option<SecretString>>,
}

/// First six characters of a token, used in logs and the extension path.
pub(crate) fn token_prefix(token: &SecretString) -> String {
    token.expose_secret().chars().take(6).collect()
}

impl SessionManager {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        store: TokenStore,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            store,
            session: Mutex::new(None),
        }
    }

    /// Return a usable session token, acquiring one if none is held.
    ///
    /// Acquisition is serialized: concurrent callers wait for the first
    /// one to finish restoring or logging in. A held session is returned
    /// without re-validation.
    pub async fn session(&self) -> Result<SecretString, Error> {
        let mut guard = self.session.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        info!("no session held yet, looking for a persisted one");
        if let Some(token) = self.restore().await {
            *guard = Some(token.clone());
            return Ok(token);
        }

        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Whether a session token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Drop the held session; the next [`session()`](Self::session) call
    /// restores or logs in again.
    pub async fn invalidate(&self) {
        if self.session.lock().await.take().is_some() {
            debug!("session invalidated");
        }
    }

    /// The token store backing this manager.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    // ── Acquisition ───────────────────────────────────────────────

    /// Load the persisted token and probe it. Any failure yields `None`.
    async fn restore(&self) -> Option<SecretString> {
        let token = match self.store.load().await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable token store");
                return None;
            }
        };

        info!(session = %token_prefix(&token), "found persisted session, testing access");
        match self.validate(&token).await {
            Ok(()) => {
                info!("persisted session is valid");
                Some(token)
            }
            Err(e) if e.is_auth_expired() => {
                info!(error = %e, "persisted session rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "could not validate persisted session, logging in instead");
                None
            }
        }
    }

    /// Lightweight validation call: `GET ZAutomation/api/v1/status`.
    pub async fn validate(&self, token: &SecretString) -> Result<(), Error> {
        let url = endpoint(&self.base_url, ApiBase::ZAutomation, "status")?;
        debug!("validating session at {}", url);

        let resp = authorize(self.http.get(url), token)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Gateway {
                status: status.as_u16(),
                message: "session validation failed".into(),
            });
        }
        Ok(())
    }

    /// Log in with username/password and persist the resulting token.
    ///
    /// `POST ZAutomation/api/v1/login` must answer 200 with a
    /// `ZWAYSession` cookie; anything else is an authentication failure.
    /// No retry is attempted.
    pub async fn login(&self) -> Result<SecretString, Error> {
        let url = endpoint(&self.base_url, ApiBase::ZAutomation, "login")?;
        info!("no usable session, logging in at {}", url);

        let body = json!({
            "login": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        info!(%status, "login response");
        if status != reqwest::StatusCode::OK {
            warn!("login rejected, check the configured user and pass");
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        let token = resp
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| SecretString::from(c.value().to_owned()))
            .ok_or_else(|| Error::Authentication {
                message: format!("login response carried no {SESSION_COOKIE} cookie"),
            })?;

        let user_id = match resp.json::<LoginResponse>().await {
            Ok(parsed) => Some(parsed.data.user_id()),
            Err(e) => {
                warn!(error = %e, "could not read profile id from login response");
                None
            }
        };

        info!(session = %token_prefix(&token), "got session, saving");
        if let Err(e) = self.store.save(&token).await {
            warn!(error = %e, "failed to persist session token");
        }

        if let Some(user_id) = user_id {
            self.extend_expiry(&user_id, &token).await;
        }

        Ok(token)
    }

    /// Best-effort: mark the session as non-expiring. Failures are logged.
    ///
    /// `PUT ZAutomation/api/v1/profiles/{userId}/token/{prefix}...`
    async fn extend_expiry(&self, user_id: &str, token: &SecretString) {
        let path = format!("profiles/{user_id}/token/{}...", token_prefix(token));
        let url = match endpoint(&self.base_url, ApiBase::ZAutomation, &path) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "unable to build session extension URL");
                return;
            }
        };

        info!("trying to set session as non-expiring");
        let result = authorize(self.http.put(url), token)
            .json(&json!({}))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().as_u16() < 300 => {
                info!("session marked as non-expiring");
                info!("the password can now be removed from the configuration if desired");
            }
            Ok(resp) => {
                warn!(
                    status = %resp.status(),
                    "unable to set session as non-expiring; re-authentication may cause delays"
                );
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "unable to set session as non-expiring; re-authentication may cause delays"
                );
            }
        }
    }
}
