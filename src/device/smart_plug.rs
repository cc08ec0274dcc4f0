// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fibaro smart plugs paired with the Toon display.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::device::{OnOffCapable, Switch};
use crate::error::Error;
use crate::session::Session;
use crate::snapshot::is_truthy;

/// A smart wall plug: the on/off core plus power usage readings.
///
/// Not every plug hardware revision meters power; the `usageCapable` config
/// flag gates the usage figures. Non-metering plugs report `0.0` rather than
/// whatever stale value the snapshot happens to carry.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toonr_lib::device::OnOffCapable;
/// use toonr_lib::ToonClient;
///
/// # async fn example(client: Arc<ToonClient>) -> toonr_lib::Result<()> {
/// let plug = client.smart_plug("washing machine");
/// if plug.usage_capable().await? {
///     println!("{} W", plug.current_usage().await?);
/// }
/// plug.turn_off().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SmartPlug<S: Session> {
    switch: Switch<S>,
    usage_capable: OnceLock<bool>,
}

impl<S: Session> SmartPlug<S> {
    /// Creates a handle for the smart plug named `name`.
    #[must_use]
    pub fn new(session: Arc<S>, name: impl Into<String>) -> Self {
        Self {
            switch: Switch::new(session, name),
            usage_capable: OnceLock::new(),
        }
    }

    /// Whether this plug hardware meters power usage.
    ///
    /// Fetched once from the config collection and cached for the handle's
    /// lifetime; the flag is a hardware property.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched on the first access.
    pub async fn usage_capable(&self) -> Result<bool, Error> {
        if let Some(cached) = self.usage_capable.get() {
            return Ok(*cached);
        }
        let fetched = self
            .switch
            .config_value("usageCapable")
            .await?
            .as_ref()
            .is_some_and(is_truthy);
        Ok(*self.usage_capable.get_or_init(|| fetched))
    }

    /// The average power usage in watts, `0.0` for non-metering hardware.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn average_usage(&self) -> Result<f64, Error> {
        self.gated_usage("avgUsage").await
    }

    /// The current power usage in watts, `0.0` for non-metering hardware.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn current_usage(&self) -> Result<f64, Error> {
        self.gated_usage("currentUsage").await
    }

    /// Today's energy usage, `0.0` for non-metering hardware.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn daily_usage(&self) -> Result<f64, Error> {
        self.gated_usage("dayUsage").await
    }

    async fn gated_usage(&self, field: &str) -> Result<f64, Error> {
        if !self.usage_capable().await? {
            return Ok(0.0);
        }
        Ok(self
            .switch
            .status_value(field)
            .await?
            .as_ref()
            .and_then(Value::as_f64)
            .unwrap_or(0.0))
    }

    /// The zwave network health indicator, read regardless of metering
    /// capability.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn network_health_state(&self) -> Result<Option<i64>, Error> {
        Ok(self
            .switch
            .status_value("networkHealthState")
            .await?
            .as_ref()
            .and_then(Value::as_i64))
    }

    /// The UUID of the quantity graph for this plug.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn quantity_graph_uuid(&self) -> Result<Option<String>, Error> {
        Ok(self
            .switch
            .config_value("quantityGraphUuid")
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    /// The UUID of the flow graph for this plug.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn flow_graph_uuid(&self) -> Result<Option<String>, Error> {
        Ok(self
            .switch
            .config_value("flowGraphUuid")
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned))
    }
}

impl<S: Session> OnOffCapable<S> for SmartPlug<S> {
    fn switch(&self) -> &Switch<S> {
        &self.switch
    }
}
