// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain value records mirroring the vendor JSON documents.
//!
//! These are immutable containers for the documents the Toon cloud API
//! returns: OAuth tokens, agreements, thermostat readings, usage counters,
//! and smoke detectors. Numeric figures are kept as `f64` because the API
//! mixes integers and decimals freely between firmware versions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes an integer that the API may encode as a number or a numeric
/// string (the token endpoint does both, depending on the tenant).
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) if n.as_i64().is_some() => Ok(n.as_i64().unwrap_or_default()),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected integer or numeric string, got {other}"
        ))),
    }
}

/// The OAuth2 token received from the vendor token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Bearer token to present on every API request.
    pub access_token: String,
    /// Lifetime of the refresh token, in seconds.
    #[serde(deserialize_with = "lenient_i64", default)]
    pub refresh_token_expires_in: i64,
    /// Lifetime of the access token, in seconds.
    #[serde(deserialize_with = "lenient_i64")]
    pub expires_in: i64,
    /// Token used to obtain a fresh access token without re-authenticating.
    pub refresh_token: String,
}

impl Token {
    /// Computes the expiry instant for a token acquired at `acquired_at`.
    #[must_use]
    pub fn expires_at(&self, acquired_at: DateTime<Utc>) -> DateTime<Utc> {
        acquired_at + Duration::seconds(self.expires_in)
    }
}

/// The credentials identifying a user against the vendor OAuth endpoint.
#[derive(Debug, Clone)]
pub struct User {
    /// OAuth client identifier issued by the vendor developer portal.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// An agreement couples an account to one physical display.
///
/// Accounts can hold several agreements (one per address); the session picks
/// one and scopes every API URL to its id.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Agreement {
    /// Agreement identifier, used as the URL path segment for all API calls.
    #[serde(rename = "agreementId")]
    pub id: String,
    /// Integrity checksum for the agreement id.
    #[serde(rename = "agreementIdChecksum", default)]
    pub checksum: String,
    /// Heating installation type (e.g. `CENTRAL_HEATING`).
    #[serde(rename = "heatingType", default)]
    pub heating_type: String,
    /// The display's advertised common name (e.g. `eneco-001-123456`).
    #[serde(rename = "displayCommonName", default)]
    pub display_common_name: String,
    /// Hardware revision of the display.
    #[serde(rename = "displayHardwareVersion", default)]
    pub display_hardware_version: String,
    /// Software version running on the display.
    #[serde(rename = "displaySoftwareVersion", default)]
    pub display_software_version: String,
    /// Whether the installation includes solar panels.
    #[serde(rename = "isToonSolar", default)]
    pub solar: bool,
    /// Whether the display is a Toonly (software-only) installation.
    #[serde(rename = "isToonly", default)]
    pub toonly: bool,
}

/// One configurable thermostat program state (comfort, home, sleep, away).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThermostatState {
    /// Numeric state identifier.
    pub id: i64,
    /// Target temperature in centidegrees (2000 = 20.0 °C).
    #[serde(rename = "tempValue", default)]
    pub temperature: f64,
    /// Domestic hot water setting.
    #[serde(default)]
    pub dhw: i64,
}

impl ThermostatState {
    /// The conventional name for this state id.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.id {
            0 => "comfort",
            1 => "home",
            2 => "sleep",
            3 => "away",
            4 => "holiday",
            _ => "unknown",
        }
    }
}

/// Live thermostat information from the `thermostatInfo` snapshot section.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ThermostatInfo {
    /// Currently active program state id.
    #[serde(rename = "activeState", default)]
    pub active_state: i64,
    /// Whether a boiler module is connected.
    #[serde(rename = "boilerModuleConnected", default)]
    pub boiler_connected: i64,
    /// Burner activity indicator.
    #[serde(rename = "burnerInfo", default)]
    pub burner_info: String,
    /// Temperature currently shown on the display, in centidegrees.
    #[serde(rename = "currentDisplayTemp", default)]
    pub current_displayed_temperature: f64,
    /// Boiler modulation level.
    #[serde(rename = "currentModulationLevel", default)]
    pub current_modulation_level: i64,
    /// Current setpoint, in centidegrees.
    #[serde(rename = "currentSetpoint", default)]
    pub current_set_point: f64,
    /// Error indicator (255 means no error).
    #[serde(rename = "errorFound", default)]
    pub error_found: i64,
    /// Whether an OpenTherm boiler is attached.
    #[serde(rename = "haveOTBoiler", default)]
    pub have_ot_boiler: i64,
    /// Id of the next scheduled program.
    #[serde(rename = "nextProgram", default)]
    pub next_program: i64,
    /// Setpoint of the next scheduled program, in centidegrees.
    #[serde(rename = "nextSetpoint", default)]
    pub next_set_point: f64,
    /// State id of the next scheduled program.
    #[serde(rename = "nextState", default)]
    pub next_state: i64,
    /// Unix timestamp of the next program change.
    #[serde(rename = "nextTime", default)]
    pub next_time: i64,
    /// OpenTherm communication error indicator.
    #[serde(rename = "otCommError", default)]
    pub ot_communication_error: String,
    /// Program mode (0 = off, 1 = on, 2 = temporary override).
    #[serde(rename = "programState", default)]
    pub program_state: i64,
    /// The setpoint the boiler is actually driven towards, in centidegrees.
    #[serde(rename = "realSetpoint", default)]
    pub real_set_point: f64,
}

/// Core usage counters, as reported for gas.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct Usage {
    /// Average usage per day.
    #[serde(rename = "avgDayValue", default)]
    pub average_daily: f64,
    /// Average usage.
    #[serde(rename = "avgValue", default)]
    pub average: f64,
    /// Cost of today's usage.
    #[serde(rename = "dayCost", default)]
    pub daily_cost: f64,
    /// Today's usage.
    #[serde(rename = "dayUsage", default)]
    pub daily_usage: f64,
    /// Whether the reading comes from a smart meter.
    #[serde(rename = "isSmart", default)]
    pub is_smart: i64,
    /// Cumulative meter reading.
    #[serde(rename = "meterReading", default)]
    pub meter_reading: f64,
    /// Current instantaneous value.
    #[serde(default)]
    pub value: f64,
}

/// Electricity usage counters: the core figures plus the low-tariff meter.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct PowerUsage {
    /// The core usage figures shared with gas.
    #[serde(flatten)]
    pub usage: Usage,
    /// Cumulative low-tariff meter reading.
    #[serde(rename = "meterReadingLow", default)]
    pub meter_reading_low: f64,
    /// Today's low-tariff usage.
    #[serde(rename = "dayLowUsage", default)]
    pub daily_usage_low: f64,
}

/// Solar production counters, reported inside the `powerUsage` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct Solar {
    /// Peak production capacity.
    #[serde(rename = "maxSolar", default)]
    pub maximum: f64,
    /// Power currently being produced.
    #[serde(rename = "valueProduced", default)]
    pub produced: f64,
    /// Current net value.
    #[serde(default)]
    pub value: f64,
    /// Average production.
    #[serde(rename = "avgProduValue", default)]
    pub average_produced: f64,
    /// Cumulative low-tariff production meter reading.
    #[serde(rename = "meterReadingLowProdu", default)]
    pub meter_reading_low_produced: f64,
    /// Cumulative production meter reading.
    #[serde(rename = "meterReadingProdu", default)]
    pub meter_reading_produced: f64,
    /// Cost equivalent of today's production.
    #[serde(rename = "dayCostProduced", default)]
    pub daily_cost_produced: f64,
}

/// A smoke detector paired with the display.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SmokeDetector {
    /// Unique identifier of the detector.
    #[serde(rename = "devUuid", default)]
    pub device_uuid: String,
    /// Configured name.
    #[serde(default)]
    pub name: String,
    /// Unix timestamp of the last connectivity change.
    #[serde(rename = "lastConnectedChange", default)]
    pub last_connected_change: i64,
    /// Connectivity indicator.
    #[serde(rename = "connected", default)]
    pub is_connected: i64,
    /// Battery charge percentage.
    #[serde(rename = "batteryLevel", default)]
    pub battery_level: i64,
    /// Hardware type of the detector.
    #[serde(rename = "type", default)]
    pub device_type: String,
}
