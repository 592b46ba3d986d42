// ── Characteristics ──
//
// The host-facing surface of a lock accessory: the lock mechanism service,
// the lock management service, and the battery service.

use serde::{Deserialize, Serialize};

use super::LockState;

/// Value reported for the lock management `Version` characteristic.
pub const FIRMWARE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Characteristic {
    // ── Lock mechanism ───────────────────────────────────────────────
    LockCurrentState,
    LockTargetState,
    // ── Lock management ──────────────────────────────────────────────
    LockControlPoint,
    AudioFeedback,
    Version,
    // ── Battery ──────────────────────────────────────────────────────
    BatteryLevel,
    ChargingState,
    StatusLowBattery,
}

impl Characteristic {
    /// Characteristics the engine publishes on every cycle.
    pub const PUBLISHED: [Self; 7] = [
        Self::LockCurrentState,
        Self::LockTargetState,
        Self::AudioFeedback,
        Self::Version,
        Self::BatteryLevel,
        Self::ChargingState,
        Self::StatusLowBattery,
    ];

    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::LockTargetState | Self::LockControlPoint | Self::AudioFeedback
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargingState {
    NotCharging,
    Charging,
    #[default]
    NotChargeable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicValue {
    Lock(LockState),
    Bool(bool),
    Percent(u8),
    Charging(ChargingState),
    Text(String),
    /// No reading yet.
    Unknown,
}

impl std::fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lock(state) => write!(f, "{state}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Charging(c) => write!(f, "{c}"),
            Self::Text(t) => f.write_str(t),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
