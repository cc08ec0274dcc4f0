// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hue lights paired with the Toon display.

use std::sync::Arc;

use serde_json::Value;

use crate::device::{OnOffCapable, Switch};
use crate::error::Error;
use crate::session::Session;

/// A light bulb: the on/off core plus the reported color.
#[derive(Debug)]
pub struct Light<S: Session> {
    switch: Switch<S>,
}

impl<S: Session> Light<S> {
    /// Creates a handle for the light named `name`.
    #[must_use]
    pub fn new(session: Arc<S>, name: impl Into<String>) -> Self {
        Self {
            switch: Switch::new(session, name),
        }
    }

    /// The RGB color value the light currently reports, as a packed integer.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched.
    pub async fn rgb_color(&self) -> Result<Option<i64>, Error> {
        Ok(self
            .switch
            .status_value("rgbColor")
            .await?
            .as_ref()
            .and_then(Value::as_i64))
    }
}

impl<S: Session> OnOffCapable<S> for Light<S> {
    fn switch(&self) -> &Switch<S> {
        &self.switch
    }
}
