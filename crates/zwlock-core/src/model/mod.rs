// ── Domain model ──
//
// Canonical types shared by discovery, reconciliation, polling, and the
// host seam. Gateway wire types stay in `zwlock-api`.

mod accessory;
mod characteristic;
mod lock;

pub use accessory::{AccessoryRecord, ConfigurationFlags, LOW_BATTERY_THRESHOLD};
pub use characteristic::{Characteristic, CharacteristicValue, ChargingState, FIRMWARE_VERSION};
pub use lock::{
    ConfigurationOption, FALLBACK_NAME, InstanceIndices, LockState, TARGET_DEVICE_TYPE,
    TARGET_VENDOR, TrackedLock,
};

/// Z-Wave node identifier as keyed in the gateway snapshot.
pub type NodeId = u32;
