// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ToonR` library.
//!
//! This module provides a comprehensive error hierarchy for handling failures
//! across the library: transport communication, JSON parsing, session
//! management, and device operations.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when interacting
/// with the Toon cloud API.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during transport communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while establishing or maintaining the session.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error occurred during device operations.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors related to HTTP communication with the cloud API.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an unexpected status code.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus {
        /// The HTTP status code that was returned.
        status: u16,
        /// The endpoint that returned it.
        endpoint: String,
    },

    /// Authentication with the cloud API failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to parsing API responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to session establishment and agreement selection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The account has no agreements registered.
    #[error("no agreements available for this account")]
    NoAgreements,

    /// No agreement matched the requested display common name.
    #[error("no agreement found for display name: {0}")]
    AgreementNotFound(String),

    /// The status endpoint is still aggregating data and returned no body.
    ///
    /// The Toon API answers `202 Accepted` while the display is being polled
    /// for the first time after authentication.
    #[error("status snapshot is not ready yet")]
    StatusNotReady,
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The status snapshot has no UUID for the device, so it cannot be
    /// addressed on the REST API.
    #[error("device {name} has no UUID in the status snapshot")]
    MissingUuid {
        /// The configured device name.
        name: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
