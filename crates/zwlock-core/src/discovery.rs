// ── Device discovery ──
//
// Picks the supported locks out of a full gateway snapshot and resolves
// which instance carries each command class the engine talks to.

use std::collections::BTreeMap;

use tracing::{debug, info};
use zwlock_api::{Device, DeviceSnapshot};

use crate::model::{InstanceIndices, NodeId, TARGET_DEVICE_TYPE, TARGET_VENDOR, TrackedLock};

/// Whether a device carries the supported vendor/type signature.
pub fn is_supported(device: &Device) -> bool {
    device.vendor() == TARGET_VENDOR && device.device_type() == TARGET_DEVICE_TYPE
}

/// Resolve the instance ids of the tracked command classes.
///
/// Instances and classes are visited in ascending id order; when several
/// instances expose the same class the last one visited wins.
pub fn resolve_instances(device: &Device) -> InstanceIndices {
    let mut indices = InstanceIndices::default();
    for (&instance_id, instance) in &device.instances {
        for &class_id in instance.command_classes.keys() {
            indices.record(class_id, instance_id);
        }
    }
    indices
}

/// Build the tracked-lock map from a snapshot, skipping ignored nodes.
pub fn discover(snapshot: &DeviceSnapshot, ignore: &[NodeId]) -> BTreeMap<NodeId, TrackedLock> {
    info!(vendor = snapshot.controller_vendor(), "gateway controller");

    let mut locks = BTreeMap::new();
    for (&node_id, device) in &snapshot.devices {
        info!(
            node_id,
            name = device.given_name(),
            vendor = device.vendor(),
            device_type = device.device_type(),
            "found device"
        );

        if ignore.contains(&node_id) {
            debug!(node_id, "device is on the ignore list");
            continue;
        }
        if !is_supported(device) {
            continue;
        }

        let instances = resolve_instances(device);
        debug!(
            node_id,
            configuration = instances.configuration,
            battery = instances.battery,
            door_lock = instances.door_lock,
            "tracking lock"
        );
        locks.insert(
            node_id,
            TrackedLock {
                node_id,
                instances,
                device: device.clone(),
            },
        );
    }
    locks
}
