// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The cached status snapshot fetched from the Toon API.
//!
//! The `/status` endpoint returns one large document describing everything
//! the display knows: connected devices, gas and power usage, thermostat
//! state, and smoke detectors. The session fetches this document, caches it,
//! and devices read through it by name.
//!
//! Device entries are kept as open JSON maps because the vendor schema varies
//! between firmware versions; a missing entry or field is a valid outcome and
//! resolves to `None`, never to an error.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::records::{PowerUsage, SmokeDetector, Solar, ThermostatInfo, ThermostatState, Usage};

/// Which device collection of the snapshot to read.
///
/// The snapshot carries two parallel collections keyed by device name:
/// `deviceStatusInfo` holds live state (connectivity, current switch state,
/// usage figures), `deviceConfigInfo` holds static configuration (device
/// type, zwave addressing, lock and capability flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Live state: `deviceStatusInfo.device[]`.
    Status,
    /// Static configuration: `deviceConfigInfo.device[]`.
    Config,
}

/// An ordered list of device entries, one open JSON map per physical device.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeviceCollection {
    #[serde(default)]
    device: Vec<Map<String, Value>>,
}

impl DeviceCollection {
    /// Returns the first entry whose `name` field matches.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Map<String, Value>> {
        self.device
            .iter()
            .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Returns a field of the entry named `name`, or `None` if either the
    /// entry or the field is absent.
    #[must_use]
    pub fn field(&self, name: &str, field: &str) -> Option<&Value> {
        self.entry(name).and_then(|entry| entry.get(field))
    }

    /// Returns the names of all entries in the collection.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.device
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
    }
}

/// The full status document returned by `GET {api_url}/status`.
///
/// Only the device collections are modeled structurally; the remaining
/// sections (`gasUsage`, `powerUsage`, `thermostatInfo`, ...) are kept as raw
/// JSON and deserialized on demand through the typed accessors, since not
/// every display reports every section.
///
/// # Examples
///
/// ```
/// use toonr_lib::snapshot::{Collection, StatusSnapshot};
///
/// let json = r#"{
///     "deviceStatusInfo": {"device": [
///         {"name": "plug1", "devUUID": "ab-12", "isConnected": 1, "currentState": 0}
///     ]},
///     "deviceConfigInfo": {"device": [
///         {"name": "plug1", "switchLocked": 0}
///     ]}
/// }"#;
/// let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
/// let uuid = snapshot.device_field(Collection::Status, "plug1", "devUUID");
/// assert_eq!(uuid.and_then(|v| v.as_str()), Some("ab-12"));
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatusSnapshot {
    /// Live device state, keyed by device name.
    #[serde(rename = "deviceStatusInfo", default)]
    device_status_info: DeviceCollection,

    /// Static device configuration, keyed by device name.
    #[serde(rename = "deviceConfigInfo", default)]
    device_config_info: DeviceCollection,

    /// All other sections of the document, kept raw.
    #[serde(flatten)]
    sections: Map<String, Value>,
}

impl StatusSnapshot {
    /// Looks up a field for the device named `name` in the chosen collection.
    ///
    /// Returns `None` if no entry matches the name or the entry lacks the
    /// field. Absence is a valid, silently handled outcome.
    #[must_use]
    pub fn device_field(&self, collection: Collection, name: &str, field: &str) -> Option<&Value> {
        self.collection(collection).field(name, field)
    }

    /// Returns the chosen device collection.
    #[must_use]
    pub fn collection(&self, collection: Collection) -> &DeviceCollection {
        match collection {
            Collection::Status => &self.device_status_info,
            Collection::Config => &self.device_config_info,
        }
    }

    /// Deserializes a raw snapshot section into `T`, or `None` if the
    /// section is absent.
    ///
    /// # Errors
    ///
    /// Returns error if the section is present but does not match the
    /// expected shape.
    fn section<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ParseError> {
        match self.sections.get(name) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Gas usage figures from the `gasUsage` section.
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn gas_usage(&self) -> Result<Option<Usage>, ParseError> {
        self.section("gasUsage")
    }

    /// Electricity usage figures from the `powerUsage` section.
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn power_usage(&self) -> Result<Option<PowerUsage>, ParseError> {
        self.section("powerUsage")
    }

    /// Solar production figures.
    ///
    /// The display reports solar counters inside the `powerUsage` section;
    /// displays without panels simply omit the fields.
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn solar(&self) -> Result<Option<Solar>, ParseError> {
        self.section("powerUsage")
    }

    /// Thermostat state and setpoint information.
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn thermostat_info(&self) -> Result<Option<ThermostatInfo>, ParseError> {
        self.section("thermostatInfo")
    }

    /// The configured thermostat states (comfort, home, sleep, away).
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn thermostat_states(&self) -> Result<Vec<ThermostatState>, ParseError> {
        #[derive(Deserialize)]
        struct States {
            #[serde(default)]
            state: Vec<ThermostatState>,
        }
        Ok(self
            .section::<States>("thermostatStates")?
            .map(|s| s.state)
            .unwrap_or_default())
    }

    /// The smoke detectors paired with the display.
    ///
    /// # Errors
    ///
    /// Returns error if the section does not match the expected shape.
    pub fn smoke_detectors(&self) -> Result<Vec<SmokeDetector>, ParseError> {
        #[derive(Deserialize)]
        struct Detectors {
            #[serde(default)]
            device: Vec<SmokeDetector>,
        }
        Ok(self
            .section::<Detectors>("smokeDetectors")?
            .map(|d| d.device)
            .unwrap_or_default())
    }
}

/// Vendor truthiness for boolean-ish snapshot fields.
///
/// The API is inconsistent about flag encodings (`1`, `true`, sometimes a
/// non-empty string), so flags are evaluated the way the original service
/// clients do: `null`, `false`, numeric zero and the empty string are false,
/// everything else is true.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StatusSnapshot {
        serde_json::from_value(json!({
            "deviceStatusInfo": {"device": [
                {"name": "plug1", "devUUID": "uuid-1", "isConnected": 1, "currentState": 0},
                {"name": "lamp", "devUUID": "uuid-2", "rgbColor": 16_750_848},
            ]},
            "deviceConfigInfo": {"device": [
                {"name": "plug1", "devType": "FGWP", "position": 0, "switchLocked": 0},
            ]},
            "gasUsage": {"avgDayValue": 100, "avgValue": 5, "dayCost": 0.5,
                         "dayUsage": 20, "isSmart": 1, "meterReading": 1234, "value": 0},
        }))
        .unwrap()
    }

    #[test]
    fn lookup_hit() {
        let snapshot = sample();
        let value = snapshot.device_field(Collection::Status, "plug1", "devUUID");
        assert_eq!(value.and_then(Value::as_str), Some("uuid-1"));
    }

    #[test]
    fn lookup_missing_device_is_none() {
        let snapshot = sample();
        assert!(
            snapshot
                .device_field(Collection::Status, "nonexistent", "devUUID")
                .is_none()
        );
        assert!(
            snapshot
                .device_field(Collection::Config, "nonexistent", "devType")
                .is_none()
        );
    }

    #[test]
    fn lookup_missing_field_is_none() {
        let snapshot = sample();
        assert!(
            snapshot
                .device_field(Collection::Status, "plug1", "noSuchField")
                .is_none()
        );
    }

    #[test]
    fn lookup_takes_first_match() {
        let snapshot: StatusSnapshot = serde_json::from_value(json!({
            "deviceStatusInfo": {"device": [
                {"name": "dup", "currentState": 1},
                {"name": "dup", "currentState": 0},
            ]},
        }))
        .unwrap();
        let value = snapshot.device_field(Collection::Status, "dup", "currentState");
        assert_eq!(value.and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn empty_snapshot_resolves_silently() {
        let snapshot = StatusSnapshot::default();
        assert!(
            snapshot
                .device_field(Collection::Status, "plug1", "isConnected")
                .is_none()
        );
        assert!(snapshot.gas_usage().unwrap().is_none());
        assert!(snapshot.thermostat_states().unwrap().is_empty());
        assert!(snapshot.smoke_detectors().unwrap().is_empty());
    }

    #[test]
    fn collection_names() {
        let snapshot = sample();
        let names: Vec<&str> = snapshot.collection(Collection::Status).names().collect();
        assert_eq!(names, vec!["plug1", "lamp"]);
    }

    #[test]
    fn gas_usage_section_parses() {
        let snapshot = sample();
        let usage = snapshot.gas_usage().unwrap().unwrap();
        assert_eq!(usage.meter_reading, 1234.0);
        assert_eq!(usage.daily_usage, 20.0);
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!("locked")));
    }
}
