// ── Core error types ──
//
// Engine-level errors. Consumers never see HTTP status codes or JSON parse
// failures directly; the `From<zwlock_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::{Characteristic, NodeId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach gateway at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Gateway request timed out")]
    Timeout,

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Lock not found: node #{node_id}")]
    LockNotFound { node_id: NodeId },

    // ── Characteristic errors ────────────────────────────────────────
    #[error("{characteristic} does not support writes")]
    NotSupported { characteristic: Characteristic },

    #[error("{characteristic} is read-only")]
    ReadOnly { characteristic: Characteristic },

    #[error("Invalid value for {characteristic}: {reason}")]
    InvalidValue {
        characteristic: Characteristic,
        reason: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Gateway API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Platform is shut down")]
    ShutDown,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zwlock_api::Error> for CoreError {
    fn from(err: zwlock_api::Error) -> Self {
        match err {
            zwlock_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            zwlock_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            zwlock_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            zwlock_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            zwlock_api::Error::Gateway { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            zwlock_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            zwlock_api::Error::TokenStore(msg) => CoreError::Internal(msg),
        }
    }
}
