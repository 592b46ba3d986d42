// ── Accessory records ──

use serde::{Deserialize, Serialize};

use super::{ConfigurationOption, LockState, NodeId};

/// Battery percentage at or below which the lock reports low battery.
pub const LOW_BATTERY_THRESHOLD: u8 = 60;

/// Cached configuration flags. A flag is on when its parameter reads 255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationFlags {
    pub beeper: bool,
    pub vacation_mode: bool,
}

impl ConfigurationFlags {
    pub fn get(&self, option: ConfigurationOption) -> bool {
        match option {
            ConfigurationOption::Beeper => self.beeper,
            ConfigurationOption::VacationMode => self.vacation_mode,
        }
    }

    pub fn set(&mut self, option: ConfigurationOption, on: bool) {
        match option {
            ConfigurationOption::Beeper => self.beeper = on,
            ConfigurationOption::VacationMode => self.vacation_mode = on,
        }
    }
}

/// Host-facing accessory state for one lock.
///
/// Persisted by the host between runs and handed back through
/// [`Platform::restore_accessory`](crate::Platform::restore_accessory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryRecord {
    pub node_id: NodeId,
    pub display_name: String,
    #[serde(default)]
    pub lock_state: LockState,
    #[serde(default)]
    pub target_state: LockState,
    /// Percentage; `None` until the first battery report.
    #[serde(default)]
    pub battery: Option<u8>,
    #[serde(default)]
    pub configuration: ConfigurationFlags,
    /// Gateway time (seconds) of the last configuration refresh.
    #[serde(default)]
    pub last_configuration_update: i64,
}

impl AccessoryRecord {
    pub fn new(node_id: NodeId, display_name: impl Into<String>) -> Self {
        Self {
            node_id,
            display_name: display_name.into(),
            lock_state: LockState::Unsecured,
            target_state: LockState::Unsecured,
            battery: None,
            configuration: ConfigurationFlags::default(),
            last_configuration_update: 0,
        }
    }

    /// Unknown battery is not reported as low.
    pub fn low_battery(&self) -> bool {
        self.battery.is_some_and(|level| level <= LOW_BATTERY_THRESHOLD)
    }
}
