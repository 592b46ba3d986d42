// ── Staleness tracking ──
//
// Decides, per poll cycle, which gateway values are old enough to ask the
// lock for again, and filters those refresh queries through the startup
// anti-flood window and the pending-query table.

use std::collections::HashMap;

use tracing::{debug, info};
use zwlock_api::{Invocation, command_class};

use crate::config::Tolerances;
use crate::model::{AccessoryRecord, ConfigurationOption, NodeId, TrackedLock};

/// Poll cycles during which refresh queries are held back after startup.
pub const ANTI_FLOOD_CYCLES: u32 = 120;
/// Counter value once the anti-flood window has closed.
const ANTI_FLOOD_FINISHED: u32 = 999;
/// Seconds after which a still-unanswered query is sent again.
pub const RETRY_AFTER_SECS: i64 = 100;

// ── Refresh requests ─────────────────────────────────────────────────

/// Identity of a refresh query for de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub device: NodeId,
    pub instance: u32,
    pub command_class: u32,
    pub parameter: Option<u32>,
}

/// A `Get` the engine wants to send, with the gateway time of the value
/// it would replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub key: QueryKey,
    pub time: i64,
}

impl RefreshRequest {
    pub fn invocation(&self) -> Invocation {
        let param = self.key.parameter.map(|p| p.to_string()).unwrap_or_default();
        Invocation::get(
            self.key.device,
            self.key.instance,
            self.key.command_class,
            &param,
        )
    }
}

/// Collect the refresh queries `lock` needs at gateway time `now`.
///
/// A due configuration refresh stamps `record.last_configuration_update`
/// with `now` whether or not the queries end up being sent.
pub fn stale_requests(
    lock: &TrackedLock,
    record: &mut AccessoryRecord,
    now: i64,
    tolerances: &Tolerances,
) -> Vec<RefreshRequest> {
    let mut requests = Vec::new();

    if now - record.last_configuration_update > tolerances.configuration {
        for option in ConfigurationOption::ALL {
            requests.push(RefreshRequest {
                key: QueryKey {
                    device: lock.node_id,
                    instance: lock.instances.configuration,
                    command_class: command_class::CONFIGURATION,
                    parameter: Some(option.parameter()),
                },
                time: record.last_configuration_update,
            });
        }
        record.last_configuration_update = now;
    }

    match lock.battery_level() {
        Some(last) if now - last.update_time > tolerances.battery => {
            requests.push(RefreshRequest {
                key: QueryKey {
                    device: lock.node_id,
                    instance: lock.instances.battery,
                    command_class: command_class::BATTERY,
                    parameter: None,
                },
                time: last.update_time,
            });
        }
        Some(_) => {}
        None => debug!(node_id = lock.node_id, "no battery reading in snapshot"),
    }

    match lock.door_lock_mode() {
        Some(mode) if now - mode.update_time > tolerances.door_lock => {
            requests.push(RefreshRequest {
                key: QueryKey {
                    device: lock.node_id,
                    instance: lock.instances.door_lock,
                    command_class: command_class::DOOR_LOCK,
                    parameter: None,
                },
                time: mode.update_time,
            });
        }
        Some(_) => {}
        None => debug!(node_id = lock.node_id, "no door-lock mode in snapshot"),
    }

    requests
}

// ── Anti-flood ───────────────────────────────────────────────────────

/// Startup window during which refresh queries are suppressed so the
/// gateway can catch up on its own.
///
/// The first cycle may dispatch; cycles 2 through 119 may not.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntiFlood {
    cycles: u32,
}

impl AntiFlood {
    /// Count a new poll cycle.
    pub fn tick(&mut self) {
        if self.cycles < ANTI_FLOOD_CYCLES {
            self.cycles += 1;
        }
        if self.cycles == ANTI_FLOOD_CYCLES {
            info!("startup anti-flood is finished");
            self.cycles = ANTI_FLOOD_FINISHED;
        }
    }

    pub fn suppresses_dispatch(&self) -> bool {
        self.cycles > 1 && self.cycles < ANTI_FLOOD_CYCLES
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

// ── Pending queries ──────────────────────────────────────────────────

/// Outcome of offering a refresh request to the pending table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not pending yet; send it.
    Dispatch,
    /// Pending for too long without an update; send it again.
    Retry,
    /// Already in flight.
    Skip,
}

impl Admission {
    pub fn dispatches(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Gateway time at which each query was last sent.
#[derive(Debug, Clone, Default)]
pub struct PendingQueries {
    sent: HashMap<QueryKey, i64>,
}

impl PendingQueries {
    /// Decide whether `request` goes out at gateway time `now`, recording
    /// it as pending when it does.
    pub fn admit(&mut self, request: &RefreshRequest, now: i64) -> Admission {
        let admission = match self.sent.get(&request.key) {
            Some(&sent) if sent >= request.time => {
                if now - request.time >= RETRY_AFTER_SECS {
                    Admission::Retry
                } else {
                    Admission::Skip
                }
            }
            _ => Admission::Dispatch,
        };
        if admission.dispatches() {
            self.sent.insert(request.key, now);
        }
        admission
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use zwlock_api::Device;

    use super::*;
    use crate::discovery::resolve_instances;

    fn lock(battery_time: i64, mode_time: i64) -> TrackedLock {
        let device: Device = serde_json::from_value(json!({
            "instances": {
                "0": { "commandClasses": {
                    "98": { "data": { "mode": { "value": 0, "updateTime": mode_time } } },
                    "128": { "data": { "last": { "value": 80, "updateTime": battery_time } } }
                } },
                "1": { "commandClasses": { "112": { "data": {} } } }
            }
        }))
        .unwrap();
        TrackedLock {
            node_id: 5,
            instances: resolve_instances(&device),
            device,
        }
    }

    fn record(last_configuration_update: i64) -> AccessoryRecord {
        let mut record = AccessoryRecord::new(5, "Front Door");
        record.last_configuration_update = last_configuration_update;
        record
    }

    #[test]
    fn staleness_is_strictly_greater_than() {
        let tol = Tolerances::default();
        let now = 1_000_000;
        let mut rec = record(now - tol.configuration);
        let requests = stale_requests(&lock(now - tol.battery, now - 5), &mut rec, now, &tol);
        assert!(requests.is_empty());
        assert_eq!(rec.last_configuration_update, now - tol.configuration);
    }

    #[test]
    fn stale_door_lock_and_battery_are_queued() {
        let tol = Tolerances::default();
        let now = 1_000_000;
        let mut rec = record(now);
        let requests = stale_requests(&lock(now - 86_401, now - 6), &mut rec, now, &tol);

        let paths: Vec<String> = requests.iter().map(|r| r.invocation().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "devices[5].instances[0].commandClasses[128].Get()",
                "devices[5].instances[0].commandClasses[98].Get()",
            ]
        );
        assert_eq!(requests[1].time, now - 6);
    }

    #[test]
    fn configuration_refresh_queues_both_options_and_stamps_record() {
        let tol = Tolerances::default();
        let now = 1_000_000;
        let mut rec = record(0);
        let requests = stale_requests(&lock(now, now), &mut rec, now, &tol);

        let paths: Vec<String> = requests.iter().map(|r| r.invocation().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "devices[5].instances[1].commandClasses[112].Get(3)",
                "devices[5].instances[1].commandClasses[112].Get(4)",
            ]
        );
        assert!(requests.iter().all(|r| r.time == 0));
        assert_eq!(rec.last_configuration_update, now);
    }

    #[test]
    fn anti_flood_window() {
        let mut flood = AntiFlood::default();
        flood.tick();
        assert!(!flood.suppresses_dispatch(), "first cycle dispatches");

        for _ in 2..ANTI_FLOOD_CYCLES {
            flood.tick();
            assert!(flood.suppresses_dispatch());
        }
        flood.tick();
        assert_eq!(flood.cycles(), 999);
        assert!(!flood.suppresses_dispatch());
        flood.tick();
        assert_eq!(flood.cycles(), 999);
    }

    #[test]
    fn pending_queries_dedupe_then_retry_after_window() {
        let key = QueryKey {
            device: 5,
            instance: 0,
            command_class: command_class::DOOR_LOCK,
            parameter: None,
        };
        let request = RefreshRequest { key, time: 1_000 };
        let mut pending = PendingQueries::default();

        assert_eq!(pending.admit(&request, 1_010), Admission::Dispatch);
        assert_eq!(pending.admit(&request, 1_011), Admission::Skip);
        assert_eq!(pending.admit(&request, 1_099), Admission::Skip);
        assert_eq!(pending.admit(&request, 1_100), Admission::Retry);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn newer_value_time_supersedes_pending_entry() {
        let key = QueryKey {
            device: 5,
            instance: 0,
            command_class: command_class::BATTERY,
            parameter: None,
        };
        let mut pending = PendingQueries::default();
        pending.admit(&RefreshRequest { key, time: 10 }, 20);

        let newer = RefreshRequest { key, time: 25 };
        assert_eq!(pending.admit(&newer, 30), Admission::Dispatch);
    }
}
