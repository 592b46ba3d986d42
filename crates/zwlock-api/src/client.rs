// Gateway HTTP client
//
// Wraps `reqwest::Client` with Z-Way URL construction and session handling.
// Three API bases hang off the configured host: ZAutomation (auth, status),
// ZWaveAPI (full data snapshot), and ZWave.zway (command invocation).

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::invocation::Invocation;
use crate::models::DeviceSnapshot;
use crate::session::{Credentials, SESSION_COOKIE, SessionManager};
use crate::token_store::TokenStore;
use crate::transport::TransportConfig;

/// The gateway API surface a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// `ZAutomation/api/v1/` -- login, status, profiles.
    ZAutomation,
    /// `ZWaveAPI/` -- raw Z-Wave data tree.
    ZWaveApi,
    /// `ZWave.zway/` -- command-class invocation.
    ZWay,
}

impl ApiBase {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ZAutomation => "ZAutomation/api/v1/",
            Self::ZWaveApi => "ZWaveAPI/",
            Self::ZWay => "ZWave.zway/",
        }
    }
}

/// Ensure the host URL ends with `/` so relative joins append to it.
pub fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Build `{host}{api prefix}{path}`.
pub(crate) fn endpoint(base_url: &Url, base: ApiBase, path: &str) -> Result<Url, Error> {
    let relative = format!("{}{}", base.prefix(), path.trim_start_matches('/'));
    base_url.join(&relative).map_err(Error::InvalidUrl)
}

/// Attach the session as both cookie and custom header.
pub(crate) fn authorize(
    builder: reqwest::RequestBuilder,
    token: &SecretString,
) -> reqwest::RequestBuilder {
    let token = token.expose_secret();
    builder
        .header(reqwest::header::COOKIE, format!("{SESSION_COOKIE}={token}"))
        .header(SESSION_COOKIE, token)
}

/// Authenticated client for the Z-Way gateway.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the
/// session. Requests are never retried here -- failures propagate to the
/// caller, which decides whether the next poll cycle tries again.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionManager,
}

impl GatewayClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the gateway root, e.g. `http://192.168.1.20:8083/`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        store: TokenStore,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials, store))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        store: TokenStore,
    ) -> Self {
        let base_url = normalize_base_url(base_url);
        let session = SessionManager::new(http.clone(), base_url.clone(), credentials, store);
        Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session,
            }),
        }
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session manager (for explicit login/validation flows).
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated request and return the raw response.
    ///
    /// Acquires a session first if none is held. A non-2xx status becomes
    /// `Error::Gateway`; a 401 additionally drops the held session so that
    /// the next request logs in again.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        base: ApiBase,
    ) -> Result<reqwest::Response, Error> {
        let token = self.inner.session.session().await?;
        let url = endpoint(&self.inner.base_url, base, path)?;
        debug!("{} {}", method, url);

        let mut builder = authorize(self.inner.http.request(method, url), &token);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.inner.session.invalidate().await;
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Gateway {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(resp)
    }

    /// Fetch the full gateway state: `GET ZWaveAPI/Data/0`.
    pub async fn snapshot(&self) -> Result<DeviceSnapshot, Error> {
        let resp = self
            .request(Method::GET, "Data/0", None, ApiBase::ZWaveApi)
            .await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(bytes = body.len(), "snapshot received");

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Post a command-class invocation: `POST ZWave.zway/Run/{invocation}`.
    pub async fn invoke(&self, invocation: &Invocation) -> Result<(), Error> {
        let _resp = self
            .request(
                Method::POST,
                &invocation.run_path(),
                Some(&json!({})),
                ApiBase::ZWay,
            )
            .await?;
        Ok(())
    }
}
