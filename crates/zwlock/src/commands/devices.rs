//! `zwlock devices`: one-shot discovery listing.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use zwlock_core::discovery::{self, is_supported};
use zwlock_core::mapping::apply_values;
use zwlock_core::{AccessoryRecord, CoreError, LockState, NodeId, Platform};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::host::EphemeralHost;
use crate::output::{self, or_dash};

#[derive(Debug, Serialize)]
struct DeviceSummary {
    node_id: NodeId,
    name: String,
    vendor: String,
    device_type: String,
    status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_state: Option<LockState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    battery: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beeper: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
enum DeviceStatus {
    Tracked,
    Ignored,
    Unsupported,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Node")]
    node: NodeId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Lock")]
    lock: String,
    #[tabled(rename = "Battery")]
    battery: String,
}

impl From<&DeviceSummary> for DeviceRow {
    fn from(d: &DeviceSummary) -> Self {
        Self {
            node: d.node_id,
            name: d.name.clone(),
            vendor: d.vendor.clone(),
            device_type: d.device_type.clone(),
            status: d.status.to_string(),
            lock: or_dash(d.lock_state),
            battery: or_dash(d.battery.map(|b| format!("{b}%"))),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let platform_config = config::platform_config(global)?;
    let ignore = platform_config.ignore.clone();
    let platform = Platform::new(platform_config, Arc::new(EphemeralHost))?;

    let snapshot = platform
        .client()
        .snapshot()
        .await
        .map_err(CoreError::from)?;
    let locks = discovery::discover(&snapshot, &ignore);

    let summaries: Vec<DeviceSummary> = snapshot
        .devices
        .iter()
        .map(|(&node_id, device)| {
            let status = if locks.contains_key(&node_id) {
                DeviceStatus::Tracked
            } else if is_supported(device) {
                DeviceStatus::Ignored
            } else {
                DeviceStatus::Unsupported
            };
            let values = locks.get(&node_id).map(|lock| {
                let mut record = AccessoryRecord::new(node_id, device.given_name());
                apply_values(&mut record, lock);
                record
            });
            DeviceSummary {
                node_id,
                name: device.given_name().to_owned(),
                vendor: device.vendor().to_owned(),
                device_type: device.device_type().to_owned(),
                status,
                lock_state: values.as_ref().map(|r| r.lock_state),
                battery: values.as_ref().and_then(|r| r.battery),
                beeper: values.as_ref().map(|r| r.configuration.beeper),
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &summaries,
        |d| DeviceRow::from(d),
        |d| d.node_id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
