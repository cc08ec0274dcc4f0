// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ToonR` Lib - A Rust library for the Toon smart-meter cloud API.
//!
//! This library provides async APIs to authenticate against the Toon (Quby)
//! cloud service, read the display's cached status snapshot, and control the
//! switchable devices paired with it.
//!
//! # Supported Features
//!
//! - **Session management**: OAuth2 password grant, token refresh, agreement
//!   selection, TTL-cached status snapshot
//! - **Device control**: Turn smart plugs and lights on/off, toggle, with
//!   capability gating for locked or disconnected devices
//! - **Power metering**: Average, current, and daily usage for metering plugs
//! - **Snapshot readers**: Gas and power usage, solar production, thermostat
//!   state, smoke detectors
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use toonr_lib::device::OnOffCapable;
//! use toonr_lib::records::User;
//! use toonr_lib::ToonClient;
//!
//! #[tokio::main]
//! async fn main() -> toonr_lib::Result<()> {
//!     let user = User {
//!         client_id: "client".into(),
//!         client_secret: "secret".into(),
//!         username: "user@example.com".into(),
//!         password: "hunter2".into(),
//!     };
//!
//!     // Authenticate and pick the first agreement on the account
//!     let client = Arc::new(ToonClient::builder().with_credentials(user).connect().await?);
//!
//!     // Devices read through the session's cached status snapshot
//!     let plug = client.smart_plug("washing machine");
//!     println!("state: {}", plug.power_state().await?);
//!
//!     // Writes go through a GET/PUT cycle and drop the cache
//!     if plug.turn_on().await? {
//!         println!("turned on");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Pre-Authorized Sessions
//!
//! When a token is managed externally (or under test), skip the password
//! grant:
//!
//! ```no_run
//! use toonr_lib::ToonClient;
//!
//! #[tokio::main]
//! async fn main() -> toonr_lib::Result<()> {
//!     let client = ToonClient::builder()
//!         .with_access_token("existing-bearer-token")
//!         .with_agreement_id("1234")
//!         .connect()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Caching Model
//!
//! The session owns one status snapshot covering every paired device. Reads
//! of volatile state (connectivity, switch state, usage) go through this
//! cache; any successful state change invalidates it so the next read of any
//! device re-fetches. Device identifiers (UUIDs, zwave addressing) are
//! assumed immutable server-side and memoized per handle on first access.

pub mod device;
pub mod error;
pub mod records;
pub mod session;
pub mod snapshot;
pub mod types;

pub use device::{Light, OnOffCapable, SmartPlug, Switch};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, SessionError};
pub use records::{
    Agreement, PowerUsage, SmokeDetector, Solar, ThermostatInfo, ThermostatState, Token, Usage,
    User,
};
pub use session::{Session, ToonClient, ToonClientBuilder};
pub use snapshot::{Collection, StatusSnapshot};
pub use types::PowerState;
