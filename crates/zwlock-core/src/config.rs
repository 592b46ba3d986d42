// ── Runtime platform configuration ──
//
// Describes *how* to reach the gateway and how aggressively to poll.
// Carries credential data but never touches disk; `zwlock-config` builds
// one from the TOML file and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::NodeId;

/// Maximum age (gateway seconds) a cached value may reach before a
/// refresh is queued. Staleness is strictly greater-than.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerances {
    pub door_lock: i64,
    pub battery: i64,
    pub configuration: i64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            door_lock: 5,
            battery: 86_400,
            configuration: 86_400,
        }
    }
}

/// Configuration for one gateway connection.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Gateway root URL (e.g. `http://192.168.1.20:8083/`).
    pub url: Url,
    /// ZAutomation login.
    pub username: String,
    pub password: SecretString,
    /// Directory holding the persisted session token.
    pub storage_dir: PathBuf,
    /// Node ids never tracked or registered.
    pub ignore: Vec<NodeId>,
    /// Remove every accessory on launch regardless of discovery.
    pub nuke: bool,
    pub tolerances: Tolerances,
    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Accept self-signed gateway certificates.
    pub insecure: bool,
}
