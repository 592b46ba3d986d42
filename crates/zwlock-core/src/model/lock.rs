// ── Lock domain types ──

use serde::{Deserialize, Serialize};
use zwlock_api::{ApiValue, CommandClass, Device, command_class};

use super::NodeId;

/// Vendor string a device must report to be tracked.
pub const TARGET_VENDOR: &str = "Allegion";
/// Device type string a device must report to be tracked.
pub const TARGET_DEVICE_TYPE: &str = "Secure Keypad";
/// Display name used when the gateway has no given name for the node.
pub const FALLBACK_NAME: &str = "Allegion Keypad";

/// Bolt position as exposed to the accessory layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    #[default]
    Unsecured,
    Secured,
}

impl LockState {
    /// Door-lock `mode` 0 is open; every other mode counts as bolted.
    pub fn from_mode(mode: i64) -> Self {
        if mode == 0 {
            Self::Unsecured
        } else {
            Self::Secured
        }
    }

    /// Argument for `DoorLock.Set(..)`.
    pub fn door_lock_mode(self) -> u8 {
        match self {
            Self::Secured => 255,
            Self::Unsecured => 0,
        }
    }
}

/// Configuration-class parameters the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ConfigurationOption {
    Beeper,
    VacationMode,
}

impl ConfigurationOption {
    pub const ALL: [Self; 2] = [Self::Beeper, Self::VacationMode];

    /// Configuration parameter number on the lock.
    pub fn parameter(self) -> u32 {
        match self {
            Self::Beeper => 3,
            Self::VacationMode => 4,
        }
    }

    /// Key of the parameter inside the configuration class `data` object.
    pub fn data_key(self) -> String {
        self.parameter().to_string()
    }
}

/// Instance ids carrying each command class; `0` means "not yet found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceIndices {
    pub configuration: u32,
    pub battery: u32,
    pub door_lock: u32,
}

impl InstanceIndices {
    /// Record `instance` for `class_id` if the class is one we track.
    pub fn record(&mut self, class_id: u32, instance: u32) {
        match class_id {
            command_class::CONFIGURATION => self.configuration = instance,
            command_class::BATTERY => self.battery = instance,
            command_class::DOOR_LOCK => self.door_lock = instance,
            _ => {}
        }
    }
}

/// A discovered lock: where its command classes live plus the latest
/// device projection from the gateway.
#[derive(Debug, Clone)]
pub struct TrackedLock {
    pub node_id: NodeId,
    pub instances: InstanceIndices,
    pub device: Device,
}

impl TrackedLock {
    pub fn door_lock(&self) -> Option<&CommandClass> {
        self.device
            .command_class(self.instances.door_lock, command_class::DOOR_LOCK)
    }

    pub fn battery(&self) -> Option<&CommandClass> {
        self.device
            .command_class(self.instances.battery, command_class::BATTERY)
    }

    pub fn configuration(&self) -> Option<&CommandClass> {
        self.device
            .command_class(self.instances.configuration, command_class::CONFIGURATION)
    }

    /// `DoorLock.data.mode`.
    pub fn door_lock_mode(&self) -> Option<ApiValue> {
        self.door_lock()?.data.value("mode")
    }

    /// `Battery.data.last`.
    pub fn battery_level(&self) -> Option<ApiValue> {
        self.battery()?.data.value("last")
    }

    /// `Configuration.data["<param>"]`.
    pub fn configuration_value(&self, option: ConfigurationOption) -> Option<ApiValue> {
        self.configuration()?.data.value(&option.data_key())
    }
}
