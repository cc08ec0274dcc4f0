// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session management for the Toon cloud API.
//!
//! A session owns the authenticated HTTP client, the selected agreement, and
//! the cached status snapshot that every device reads through. Devices never
//! talk to the cache directly: they read snapshots via [`Session::status`]
//! and drop the cache via [`Session::invalidate`] after a write.

mod client;

pub use client::{ToonClient, ToonClientBuilder};

use std::sync::Arc;

use crate::error::Error;
use crate::snapshot::StatusSnapshot;

/// The seam between device handles and the cloud session.
///
/// [`ToonClient`] is the production implementation; tests substitute their
/// own to exercise devices against canned snapshots.
#[allow(async_fn_in_trait)]
pub trait Session: Send + Sync {
    /// The agreement-scoped base URL, e.g. `https://api.toon.eu/toon/v3/{agreement_id}`.
    fn api_url(&self) -> String;

    /// The bearer token to present on API requests.
    fn access_token(&self) -> String;

    /// The shared HTTP client used for device-level requests.
    fn http(&self) -> &reqwest::Client;

    /// Returns the current status snapshot, fetching it if the cache is
    /// empty or stale.
    ///
    /// The returned snapshot is shared: all devices observe the same
    /// document until the cache is invalidated and re-fetched.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or parsed.
    async fn status(&self) -> Result<Arc<StatusSnapshot>, Error>;

    /// Drops the cached snapshot so the next [`Session::status`] call
    /// re-fetches from the API.
    fn invalidate(&self);
}
