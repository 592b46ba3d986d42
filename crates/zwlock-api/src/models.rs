// Z-Way response types
//
// Models for `ZWaveAPI/Data/0` and the ZAutomation login response. The
// gateway returns far more than we model; fields use `#[serde(default)]`
// liberally because presence varies across firmware versions and interview
// progress. Integer-keyed maps deserialize into `BTreeMap<u32, _>` so that
// iteration is in ascending node/instance/class order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Typed value ──────────────────────────────────────────────────────

/// A typed value leaf as the gateway reports it.
///
/// ```json
/// { "type": "int", "value": 255, "updateTime": 1700000000, "invalidTime": 1699999999 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiValue {
    #[serde(default, rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub update_time: i64,
    #[serde(default)]
    pub invalid_time: i64,
}

impl ApiValue {
    /// Integer view of the value. Booleans map to 0/1.
    pub fn as_i64(&self) -> Option<i64> {
        self.value
            .as_i64()
            .or_else(|| self.value.as_bool().map(i64::from))
    }

    /// String view of the value; empty when the value is not a string.
    pub fn as_str(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Full gateway state from `GET ZWaveAPI/Data/0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub controller: ControllerDescriptor,
    #[serde(default)]
    pub devices: BTreeMap<u32, Device>,
    /// Gateway clock (seconds) at which this snapshot was produced.
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerDescriptor {
    #[serde(default)]
    pub data: ControllerData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerData {
    #[serde(default)]
    pub vendor: ApiValue,
}

impl DeviceSnapshot {
    /// Controller vendor string, e.g. `"RaZberry"`.
    pub fn controller_vendor(&self) -> &str {
        self.controller.data.vendor.as_str()
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// One gateway-known node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub data: DeviceData,
    #[serde(default)]
    pub instances: BTreeMap<u32, Instance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    #[serde(default)]
    pub given_name: ApiValue,
    #[serde(default)]
    pub vendor_string: ApiValue,
    #[serde(default)]
    pub device_type_string: ApiValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub command_classes: BTreeMap<u32, CommandClass>,
}

/// A command class exposed by an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandClass {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: CommandClassData,
}

/// Open-ended command class data. Entries of interest (`mode`, `last`,
/// configuration parameter numbers) are typed values; everything else is
/// left as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandClassData(pub BTreeMap<String, serde_json::Value>);

impl CommandClassData {
    /// Decode the entry under `key` as a typed value.
    pub fn value(&self, key: &str) -> Option<ApiValue> {
        let raw = self.0.get(key)?;
        if !raw.is_object() {
            return None;
        }
        serde_json::from_value(raw.clone()).ok()
    }
}

impl Device {
    pub fn given_name(&self) -> &str {
        self.data.given_name.as_str()
    }

    pub fn vendor(&self) -> &str {
        self.data.vendor_string.as_str()
    }

    pub fn device_type(&self) -> &str {
        self.data.device_type_string.as_str()
    }

    /// Look up a command class on a specific instance.
    pub fn command_class(&self, instance: u32, class_id: u32) -> Option<&CommandClass> {
        self.instances.get(&instance)?.command_classes.get(&class_id)
    }
}

// ── Login ────────────────────────────────────────────────────────────

/// Body of a successful `POST ZAutomation/api/v1/login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    /// Profile id; numeric on current firmware, tolerated as a string.
    pub id: serde_json::Value,
}

impl LoginData {
    pub fn user_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
