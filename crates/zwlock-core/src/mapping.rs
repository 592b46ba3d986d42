// ── Snapshot → accessory value mapping ──

use crate::model::{AccessoryRecord, ConfigurationOption, LockState, TrackedLock};

/// Configuration parameter value meaning "enabled".
const OPTION_ENABLED: i64 = 255;

/// A lock-state transition observed while applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: LockState,
    pub to: LockState,
}

/// Copy the latest gateway values of `lock` into `record`.
///
/// Values missing from the snapshot leave the cached ones untouched.
pub fn apply_values(record: &mut AccessoryRecord, lock: &TrackedLock) -> Option<StateChange> {
    let mut change = None;

    if let Some(mode) = lock.door_lock_mode().and_then(|v| v.as_i64()) {
        let state = LockState::from_mode(mode);
        if state != record.lock_state {
            change = Some(StateChange {
                from: record.lock_state,
                to: state,
            });
            record.lock_state = state;
            record.target_state = state;
        }
    }

    // VacationMode is tracked only. Enabling it resets the code length on
    // the lock, so it is never offered as a writable characteristic.
    for option in ConfigurationOption::ALL {
        if let Some(value) = lock.configuration_value(option) {
            record
                .configuration
                .set(option, value.as_i64() == Some(OPTION_ENABLED));
        }
    }

    if let Some(level) = lock.battery_level().and_then(|v| v.as_i64()) {
        record.battery = Some(clamp_percent(level));
    }

    change
}

fn clamp_percent(level: i64) -> u8 {
    u8::try_from(level.clamp(0, 100)).unwrap_or(100)
}
