//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use zwlock_config::ConfigError;
use zwlock_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to gateway at {url}")]
    #[diagnostic(
        code(zwlock::connection_failed),
        help(
            "Check that the Z-Way gateway is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Gateway request timed out")]
    #[diagnostic(
        code(zwlock::timeout),
        help("Raise timeout_secs in the config or check the gateway's load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(zwlock::auth_failed),
        help(
            "Verify `user` and the password (ZWLOCK_PASS, keyring entry\n\
             \"zwlock\" / \"<user>/password\", or `pass` in the config file)."
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for '{user}'")]
    #[diagnostic(
        code(zwlock::no_credentials),
        help(
            "Set ZWLOCK_PASS, store it in the keyring, or add `pass` to {path}.\n\
             The password can be removed again once a session has been saved."
        )
    )]
    NoCredentials { user: String, path: String },

    // ── Locks ────────────────────────────────────────────────────────
    #[error("Lock #{node_id} not found")]
    #[diagnostic(
        code(zwlock::not_found),
        help("Run: zwlock devices to see tracked locks")
    )]
    NotFound { node_id: u32 },

    #[error("{what} is not supported")]
    #[diagnostic(code(zwlock::unsupported))]
    Unsupported { what: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Gateway error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(zwlock::api_error))]
    Api { status: Option<u16>, message: String },

    #[error("Platform stopped before the command completed")]
    #[diagnostic(code(zwlock::shut_down))]
    ShutDown,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zwlock::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(zwlock::no_config),
        help(
            "Create one with at least `host` and `user`, or pass --host.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(zwlock::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(zwlock::json))]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(zwlock::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::LockNotFound { node_id } => Self::NotFound { node_id },
            CoreError::NotSupported { characteristic }
            | CoreError::ReadOnly { characteristic } => Self::Unsupported {
                what: format!("Writing {characteristic}"),
            },
            CoreError::InvalidValue {
                characteristic,
                reason,
            } => Self::Validation {
                field: characteristic.to_string(),
                reason,
            },
            CoreError::Api { message, status } => Self::Api { status, message },
            CoreError::ShutDown => Self::ShutDown,
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { user, storage_dir: _ } => Self::NoCredentials {
                user,
                path: zwlock_config::config_path().display().to_string(),
            },
            ConfigError::Serialization(e) => Self::Internal(e.to_string()),
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
