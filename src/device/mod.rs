// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device handles for the switchable hardware behind a Toon display.
//!
//! All switchable devices (Fibaro smart plugs, Hue lights) share the same
//! on/off core: read state from the session's cached status snapshot, change
//! state through a read-modify-write cycle on the REST API, then drop the
//! session cache so the next read is fresh. That core is [`Switch`];
//! [`SmartPlug`] and [`Light`] are concrete device kinds composing it and
//! exposing it through the [`OnOffCapable`] trait.
//!
//! Reads fall into two classes:
//!
//! - **Volatile** fields (connectivity, current state, usage figures) are
//!   read from the snapshot on every access.
//! - **Identifiers** (`device_uuid`, `device_type`, zwave addressing) are
//!   assumed immutable server-side and fetched at most once per handle, even
//!   if the underlying snapshot is replaced.
//!
//! Handles hold the session by `Arc` and are constructed per logical
//! device; they carry no destructor logic.

mod light;
mod smart_plug;

pub use light::Light;
pub use smart_plug::SmartPlug;

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::{DeviceError, Error, ParseError, ProtocolError};
use crate::session::Session;
use crate::snapshot::{Collection, is_truthy};
use crate::types::PowerState;

/// The shared on/off core of a switchable device.
///
/// A `Switch` is identified by the device `name` assigned in the Toon app;
/// every read resolves that name against the session's status snapshot.
/// Lookups that miss (unknown name, absent field) resolve to `None` and are
/// never errors.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toonr_lib::ToonClient;
///
/// # async fn example(client: Arc<ToonClient>) -> toonr_lib::Result<()> {
/// let switch = client.switch("christmas tree");
/// if switch.can_toggle().await? {
///     switch.toggle().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Switch<S: Session> {
    session: Arc<S>,
    name: String,
    device_uuid: OnceLock<Option<String>>,
    device_type: OnceLock<Option<String>>,
    zwave_index: OnceLock<Option<i64>>,
    zwave_uuid: OnceLock<Option<String>>,
}

impl<S: Session> Switch<S> {
    /// Creates a handle for the device named `name`.
    #[must_use]
    pub fn new(session: Arc<S>, name: impl Into<String>) -> Self {
        Self {
            session,
            name: name.into(),
            device_uuid: OnceLock::new(),
            device_type: OnceLock::new(),
            zwave_index: OnceLock::new(),
            zwave_uuid: OnceLock::new(),
        }
    }

    /// The name of the device.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The session this handle reads through.
    #[must_use]
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Reads a field for this device from the live status collection.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn status_value(&self, field: &str) -> Result<Option<Value>, Error> {
        self.lookup(Collection::Status, field).await
    }

    /// Reads a field for this device from the static config collection.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn config_value(&self, field: &str) -> Result<Option<Value>, Error> {
        self.lookup(Collection::Config, field).await
    }

    async fn lookup(&self, collection: Collection, field: &str) -> Result<Option<Value>, Error> {
        let snapshot = self.session.status().await?;
        Ok(snapshot
            .device_field(collection, &self.name, field)
            .cloned())
    }

    // ========== Volatile State ==========

    /// Whether the device is currently reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn is_connected(&self) -> Result<bool, Error> {
        Ok(self
            .status_value("isConnected")
            .await?
            .as_ref()
            .is_some_and(is_truthy))
    }

    /// Whether the switch is locked against state changes.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn is_locked(&self) -> Result<bool, Error> {
        Ok(self
            .config_value("switchLocked")
            .await?
            .as_ref()
            .is_some_and(is_truthy))
    }

    /// Whether the device can change state: connected and not locked.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn can_toggle(&self) -> Result<bool, Error> {
        Ok(self.is_connected().await? && !self.is_locked().await?)
    }

    /// The raw `currentState` value (0, 1, or absent).
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn current_state(&self) -> Result<Option<i64>, Error> {
        Ok(self
            .status_value("currentState")
            .await?
            .as_ref()
            .and_then(Value::as_i64))
    }

    /// The current state rendered as [`PowerState`].
    ///
    /// An absent or zero `currentState` reads as [`PowerState::Off`].
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn power_state(&self) -> Result<PowerState, Error> {
        let on = self
            .status_value("currentState")
            .await?
            .as_ref()
            .is_some_and(is_truthy);
        Ok(PowerState::from(on))
    }

    /// Whether the device participates in the switch-all group.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn in_switch_all_group(&self) -> Result<bool, Error> {
        Ok(self
            .config_value("inSwitchAll")
            .await?
            .as_ref()
            .is_some_and(is_truthy))
    }

    /// Whether the device follows a switch schedule.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn in_switch_schedule(&self) -> Result<bool, Error> {
        Ok(self
            .config_value("inSwitchSchedule")
            .await?
            .as_ref()
            .is_some_and(is_truthy))
    }

    // ========== Memoized Identifiers ==========

    /// The UUID of the device, fetched once and cached for the handle's
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched on the first access.
    pub async fn device_uuid(&self) -> Result<Option<String>, Error> {
        if let Some(cached) = self.device_uuid.get() {
            return Ok(cached.clone());
        }
        let fetched = self
            .status_value("devUUID")
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(self.device_uuid.get_or_init(|| fetched).clone())
    }

    /// The vendor device type, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched on the first access.
    pub async fn device_type(&self) -> Result<Option<String>, Error> {
        if let Some(cached) = self.device_type.get() {
            return Ok(cached.clone());
        }
        let fetched = self
            .config_value("devType")
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(self.device_type.get_or_init(|| fetched).clone())
    }

    /// The zwave network position, fetched once and cached.
    ///
    /// Position `0` is a legitimate index and stays cached; the cell tracks
    /// populated-or-not explicitly rather than treating zero as unset.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched on the first access.
    pub async fn zwave_index(&self) -> Result<Option<i64>, Error> {
        if let Some(cached) = self.zwave_index.get() {
            return Ok(*cached);
        }
        let fetched = self
            .config_value("position")
            .await?
            .as_ref()
            .and_then(Value::as_i64);
        Ok(*self.zwave_index.get_or_init(|| fetched))
    }

    /// The zwave UUID, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched on the first access.
    pub async fn zwave_uuid(&self) -> Result<Option<String>, Error> {
        if let Some(cached) = self.zwave_uuid.get() {
            return Ok(cached.clone());
        }
        let fetched = self
            .config_value("zwUuid")
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(self.zwave_uuid.get_or_init(|| fetched).clone())
    }

    // ========== State Changes ==========

    /// Toggles the device.
    ///
    /// Returns `Ok(false)` without touching the network if the device cannot
    /// toggle (disconnected or locked).
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    pub async fn toggle(&self) -> Result<bool, Error> {
        let next = self.power_state().await?.inverted();
        self.set_state(next).await
    }

    /// Turns the device on.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    pub async fn turn_on(&self) -> Result<bool, Error> {
        self.set_state(PowerState::On).await
    }

    /// Turns the device off.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    pub async fn turn_off(&self) -> Result<bool, Error> {
        self.set_state(PowerState::Off).await
    }

    /// Drives the device to `state` through a read-modify-write cycle.
    ///
    /// Fetches the device's full representation from
    /// `{api_url}/devices/{device_uuid}`, overwrites `currentState`, PUTs the
    /// representation back, and unconditionally drops the session's snapshot
    /// cache so the next read re-fetches.
    ///
    /// If the device cannot toggle, a warning is logged and `Ok(false)` is
    /// returned with no network traffic.
    ///
    /// The PUT response status is logged but not checked, matching the
    /// service's established client behavior; transport failures do
    /// propagate as errors.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot fetch, the GET, or the PUT transport
    /// fails, or if the device has no UUID in the snapshot.
    pub async fn set_state(&self, state: PowerState) -> Result<bool, Error> {
        if !self.can_toggle().await? {
            tracing::warn!(
                device = %self.name,
                "device is not connected or is locked, cannot change state"
            );
            return Ok(false);
        }

        let uuid = self
            .device_uuid()
            .await?
            .ok_or_else(|| DeviceError::MissingUuid {
                name: self.name.clone(),
            })?;
        let url = format!("{}/devices/{uuid}", self.session.api_url());

        tracing::debug!(device = %self.name, url = %url, state = %state, "changing device state");
        let response = self
            .session
            .http()
            .get(&url)
            .bearer_auth(self.session.access_token())
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let mut representation: Value = response.json().await.map_err(ProtocolError::Http)?;

        match representation.as_object_mut() {
            Some(fields) => {
                let _ = fields.insert(
                    "currentState".to_string(),
                    Value::from(i64::from(state.as_num())),
                );
            }
            None => {
                return Err(ParseError::UnexpectedFormat(
                    "device representation is not a JSON object".to_string(),
                )
                .into());
            }
        }

        let response = self
            .session
            .http()
            .put(&url)
            .bearer_auth(self.session.access_token())
            .json(&representation)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        tracing::debug!(
            device = %self.name,
            status = %response.status(),
            "state change response received"
        );

        self.session.invalidate();
        Ok(true)
    }
}

/// The shared on/off capability of switchable devices.
///
/// Concrete device kinds expose their [`Switch`] core through
/// [`switch`](OnOffCapable::switch) and inherit the provided methods, so new
/// device kinds compose the core instead of subclassing it.
#[allow(async_fn_in_trait)]
pub trait OnOffCapable<S: Session> {
    /// The on/off core of this device.
    fn switch(&self) -> &Switch<S>;

    /// The name of the device.
    fn name<'a>(&'a self) -> &'a str
    where
        S: 'a,
    {
        self.switch().name()
    }

    /// Whether the device is currently reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    async fn is_connected(&self) -> Result<bool, Error> {
        self.switch().is_connected().await
    }

    /// Whether the switch is locked against state changes.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    async fn is_locked(&self) -> Result<bool, Error> {
        self.switch().is_locked().await
    }

    /// Whether the device can change state: connected and not locked.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    async fn can_toggle(&self) -> Result<bool, Error> {
        self.switch().can_toggle().await
    }

    /// The current state rendered as [`PowerState`].
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    async fn power_state(&self) -> Result<PowerState, Error> {
        self.switch().power_state().await
    }

    /// Toggles the device.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    async fn toggle(&self) -> Result<bool, Error> {
        self.switch().toggle().await
    }

    /// Turns the device on.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    async fn turn_on(&self) -> Result<bool, Error> {
        self.switch().turn_on().await
    }

    /// Turns the device off.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot or the device representation cannot be
    /// fetched.
    async fn turn_off(&self) -> Result<bool, Error> {
        self.switch().turn_off().await
    }
}

impl<S: Session> OnOffCapable<S> for Switch<S> {
    fn switch(&self) -> &Switch<S> {
        self
    }
}
