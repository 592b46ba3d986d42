//! Configuration for zwlock.
//!
//! One TOML file, environment overrides, credential resolution
//! (env + keyring + plaintext), and translation to
//! `zwlock_core::PlatformConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zwlock_api::{TOKEN_FILE_NAME, normalize_base_url};
use zwlock_core::{PlatformConfig, Tolerances};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "ZWLOCK_";
/// Environment variable checked first for the gateway password.
pub const PASSWORD_ENV: &str = "ZWLOCK_PASS";
/// Keyring service name.
pub const KEYRING_SERVICE: &str = "zwlock";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for '{user}' and no saved session in {}", .storage_dir.display())]
    NoCredentials { user: String, storage_dir: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Gateway root URL (e.g. "http://192.168.1.20:8083").
    #[serde(default)]
    pub host: String,

    /// ZAutomation login.
    #[serde(default)]
    pub user: String,

    /// Password (plaintext; prefer keyring or `ZWLOCK_PASS`). May be left
    /// empty once a non-expiring session has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,

    /// Node ids never turned into accessories.
    #[serde(default)]
    pub ignore: Vec<u32>,

    /// Remove every accessory on launch. Any value counts as set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuke: Option<toml::Value>,

    /// Where the session token and accessory records live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept self-signed gateway certificates.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub tolerances: TolerancesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            pass: None,
            ignore: Vec::new(),
            nuke: None,
            storage_dir: None,
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            insecure: false,
            tolerances: TolerancesConfig::default(),
        }
    }
}

/// Staleness tolerances in gateway seconds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TolerancesConfig {
    #[serde(default = "default_door_lock_tolerance")]
    pub door_lock: i64,
    #[serde(default = "default_battery_tolerance")]
    pub battery: i64,
    #[serde(default = "default_configuration_tolerance")]
    pub configuration: i64,
}

impl Default for TolerancesConfig {
    fn default() -> Self {
        Self {
            door_lock: default_door_lock_tolerance(),
            battery: default_battery_tolerance(),
            configuration: default_configuration_tolerance(),
        }
    }
}

impl From<TolerancesConfig> for Tolerances {
    fn from(t: TolerancesConfig) -> Self {
        Self {
            door_lock: t.door_lock,
            battery: t.battery,
            configuration: t.configuration,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_door_lock_tolerance() -> i64 {
    Tolerances::default().door_lock
}
fn default_battery_tolerance() -> i64 {
    Tolerances::default().battery
}
fn default_configuration_tolerance() -> i64 {
    Tolerances::default().configuration
}

impl Config {
    pub fn nuke(&self) -> bool {
        self.nuke.is_some()
    }

    /// Storage directory, falling back to the platform data dir.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }

    /// Gateway URL with a trailing `/`.
    pub fn host_url(&self) -> Result<url::Url, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "host".into(),
                reason: "missing gateway URL".into(),
            });
        }
        let url: url::Url = self
            .host
            .trim()
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "host".into(),
                reason: format!("invalid URL '{}': {e}", self.host),
            })?;
        Ok(normalize_base_url(url))
    }

    /// Build the engine config, resolving the password.
    pub fn to_platform_config(&self) -> Result<PlatformConfig, ConfigError> {
        let url = self.host_url()?;
        if self.user.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "user".into(),
                reason: "missing login".into(),
            });
        }

        let storage_dir = self.storage_dir();
        let password = match resolve_password(self) {
            Some(pw) => pw,
            None if storage_dir.join(TOKEN_FILE_NAME).exists() => SecretString::from(String::new()),
            None => {
                return Err(ConfigError::NoCredentials {
                    user: self.user.clone(),
                    storage_dir,
                });
            }
        };

        Ok(PlatformConfig {
            url,
            username: self.user.clone(),
            password,
            storage_dir,
            ignore: self.ignore.clone(),
            nuke: self.nuke(),
            tolerances: self.tolerances.into(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            insecure: self.insecure,
        })
    }

    /// Render as TOML with the password masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        if redacted.pass.as_deref().is_some_and(|p| !p.is_empty()) {
            redacted.pass = Some("********".into());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "zwlock", "zwlock")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for the session token and accessory records.
pub fn default_storage_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("zwlock");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from `path` + environment. A missing file is not an
/// error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password: `ZWLOCK_PASS` → keyring → plaintext `pass`.
///
/// Empty values are treated as absent.
pub fn resolve_password(config: &Config) -> Option<SecretString> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Some(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if !config.user.is_empty() {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(&config.user)) {
            if let Ok(pw) = entry.get_password() {
                return Some(SecretString::from(pw));
            }
        }
    }

    // 3. Plaintext in config
    config
        .pass
        .as_ref()
        .filter(|pw| !pw.is_empty())
        .map(|pw| SecretString::from(pw.clone()))
}

/// Keyring account name for a login.
pub fn keyring_user(user: &str) -> String {
    format!("{user}/password")
}
