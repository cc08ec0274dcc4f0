// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The concrete Toon cloud session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::device::{Light, SmartPlug, Switch};
use crate::error::{Error, ParseError, ProtocolError, SessionError};
use crate::records::{
    Agreement, PowerUsage, SmokeDetector, Solar, ThermostatInfo, ThermostatState, Token, Usage,
    User,
};
use crate::session::Session;
use crate::snapshot::{Collection, StatusSnapshot};

/// Default base URL of the Toon cloud API.
pub const DEFAULT_BASE_URL: &str = "https://api.toon.eu/toon/v3";

/// Safety margin before token expiry at which a refresh is attempted.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct TokenState {
    token: Token,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    snapshot: Arc<StatusSnapshot>,
}

/// An authenticated session against the Toon cloud API.
///
/// The client owns the OAuth token, the selected agreement, and a TTL-bound
/// cache of the status snapshot. Construct it through [`ToonClient::builder`]
/// and wrap it in an [`Arc`] to hand out device handles.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toonr_lib::device::OnOffCapable;
/// use toonr_lib::records::User;
/// use toonr_lib::ToonClient;
///
/// # async fn example() -> toonr_lib::Result<()> {
/// let user = User {
///     client_id: "client".into(),
///     client_secret: "secret".into(),
///     username: "user@example.com".into(),
///     password: "hunter2".into(),
/// };
/// let client = Arc::new(ToonClient::builder().with_credentials(user).connect().await?);
///
/// let plug = client.smart_plug("kitchen");
/// if plug.can_toggle().await? {
///     plug.turn_on().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ToonClient {
    http: Client,
    base_url: String,
    agreement: Agreement,
    user: Option<User>,
    token: RwLock<TokenState>,
    cache: RwLock<Option<CacheEntry>>,
    cache_ttl: Duration,
}

impl ToonClient {
    /// Creates a builder for a new session.
    #[must_use]
    pub fn builder() -> ToonClientBuilder {
        ToonClientBuilder::new()
    }

    /// The agreement the session is scoped to.
    #[must_use]
    pub fn agreement(&self) -> &Agreement {
        &self.agreement
    }

    // ========== Device Handles ==========

    /// Returns a handle for the bare switch named `name`.
    #[must_use]
    pub fn switch(self: &Arc<Self>, name: impl Into<String>) -> Switch<Self> {
        Switch::new(Arc::clone(self), name)
    }

    /// Returns a handle for the smart plug named `name`.
    #[must_use]
    pub fn smart_plug(self: &Arc<Self>, name: impl Into<String>) -> SmartPlug<Self> {
        SmartPlug::new(Arc::clone(self), name)
    }

    /// Returns a handle for the light named `name`.
    #[must_use]
    pub fn light(self: &Arc<Self>, name: impl Into<String>) -> Light<Self> {
        Light::new(Arc::clone(self), name)
    }

    /// Returns handles for all smart plugs known to the display.
    ///
    /// Plugs are recognized by their Fibaro wall-plug device type (`FGWP*`)
    /// in the config collection.
    ///
    /// # Errors
    ///
    /// Returns error if the status snapshot cannot be fetched.
    pub async fn smart_plugs(self: &Arc<Self>) -> Result<Vec<SmartPlug<Self>>, Error> {
        let snapshot = self.status().await?;
        Ok(snapshot
            .collection(Collection::Config)
            .names()
            .filter(|name| {
                snapshot
                    .device_field(Collection::Config, name, "devType")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|ty| ty.starts_with("FGWP"))
            })
            .map(|name| self.smart_plug(name))
            .collect())
    }

    /// Returns handles for all lights known to the display.
    ///
    /// Lights are recognized by a device type containing `light` in the
    /// config collection.
    ///
    /// # Errors
    ///
    /// Returns error if the status snapshot cannot be fetched.
    pub async fn lights(self: &Arc<Self>) -> Result<Vec<Light<Self>>, Error> {
        let snapshot = self.status().await?;
        Ok(snapshot
            .collection(Collection::Config)
            .names()
            .filter(|name| {
                snapshot
                    .device_field(Collection::Config, name, "devType")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|ty| ty.to_lowercase().contains("light"))
            })
            .map(|name| self.light(name))
            .collect())
    }

    // ========== Typed Snapshot Readers ==========

    /// Gas usage figures from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn gas_usage(&self) -> Result<Option<Usage>, Error> {
        Ok(self.status().await?.gas_usage()?)
    }

    /// Electricity usage figures from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn power_usage(&self) -> Result<Option<PowerUsage>, Error> {
        Ok(self.status().await?.power_usage()?)
    }

    /// Solar production figures from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn solar(&self) -> Result<Option<Solar>, Error> {
        Ok(self.status().await?.solar()?)
    }

    /// Thermostat information from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn thermostat_info(&self) -> Result<Option<ThermostatInfo>, Error> {
        Ok(self.status().await?.thermostat_info()?)
    }

    /// Configured thermostat states from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn thermostat_states(&self) -> Result<Vec<ThermostatState>, Error> {
        Ok(self.status().await?.thermostat_states()?)
    }

    /// Smoke detectors from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be fetched or the section is
    /// malformed.
    pub async fn smoke_detectors(&self) -> Result<Vec<SmokeDetector>, Error> {
        Ok(self.status().await?.smoke_detectors()?)
    }

    // ========== Token Handling ==========

    /// Refreshes the access token if it is about to expire.
    ///
    /// Requires stored credentials and a refresh token; sessions built from
    /// a bare access token keep using it unchanged.
    async fn ensure_token(&self) -> Result<(), Error> {
        let (needs_refresh, refresh_token) = {
            let state = self.token.read();
            let deadline =
                state.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
            (
                Utc::now() >= deadline && !state.token.refresh_token.is_empty(),
                state.token.refresh_token.clone(),
            )
        };
        let Some(user) = self.user.as_ref() else {
            return Ok(());
        };
        if !needs_refresh {
            return Ok(());
        }

        tracing::debug!("access token close to expiry, refreshing");
        let token = request_token(
            &self.http,
            &self.base_url,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &user.client_id),
                ("client_secret", &user.client_secret),
                ("refresh_token", &refresh_token),
            ],
        )
        .await?;
        let expires_at = token.expires_at(Utc::now());
        *self.token.write() = TokenState { token, expires_at };
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<StatusSnapshot, Error> {
        self.ensure_token().await?;
        let url = format!("{}/status", self.api_url());
        tracing::debug!(url = %url, "fetching status snapshot");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token())
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        match response.status() {
            StatusCode::ACCEPTED => Err(SessionError::StatusNotReady.into()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ProtocolError::AuthenticationFailed.into())
            }
            status if status.is_success() => {
                let body = response.text().await.map_err(ProtocolError::Http)?;
                Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
            }
            status => Err(ProtocolError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: url,
            }
            .into()),
        }
    }
}

impl Session for ToonClient {
    fn api_url(&self) -> String {
        format!("{}/{}", self.base_url, self.agreement.id)
    }

    fn access_token(&self) -> String {
        self.token.read().token.access_token.clone()
    }

    fn http(&self) -> &Client {
        &self.http
    }

    async fn status(&self) -> Result<Arc<StatusSnapshot>, Error> {
        {
            let cache = self.cache.read();
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(Arc::clone(&entry.snapshot));
                }
            }
        }

        let snapshot = Arc::new(self.fetch_snapshot().await?);
        *self.cache.write() = Some(CacheEntry {
            fetched_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    fn invalidate(&self) {
        tracing::debug!("dropping cached status snapshot");
        *self.cache.write() = None;
    }
}

/// Builder for a [`ToonClient`] session.
///
/// Two entry paths exist:
///
/// - Credentials: [`with_credentials`](Self::with_credentials) runs the OAuth
///   password grant and discovers agreements on
///   [`connect`](Self::connect).
/// - Pre-authorized: [`with_access_token`](Self::with_access_token) (plus
///   optionally [`with_agreement_id`](Self::with_agreement_id)) skips the
///   grant, useful when a token is managed externally or in tests.
#[derive(Debug, Default)]
pub struct ToonClientBuilder {
    user: Option<User>,
    access_token: Option<String>,
    agreement_id: Option<String>,
    base_url: Option<String>,
    display_common_name: Option<String>,
    cache_ttl: Option<Duration>,
    timeout: Option<Duration>,
}

impl ToonClientBuilder {
    /// Default TTL of the status snapshot cache.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OAuth credentials for the password grant.
    #[must_use]
    pub fn with_credentials(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Uses an existing access token instead of running the password grant.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Pins the agreement id, skipping agreement discovery.
    #[must_use]
    pub fn with_agreement_id(mut self, id: impl Into<String>) -> Self {
        self.agreement_id = Some(id.into());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Selects the agreement by display common name instead of taking the
    /// first one.
    #[must_use]
    pub fn with_display(mut self, display_common_name: impl Into<String>) -> Self {
        self.display_common_name = Some(display_common_name.into());
        self
    }

    /// Sets the TTL of the status snapshot cache.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Authenticates and resolves the agreement, producing a ready session.
    ///
    /// # Errors
    ///
    /// Returns error if authentication fails, the account has no agreements,
    /// or the requested display name does not match any agreement.
    pub async fn connect(self) -> Result<ToonClient, Error> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(ProtocolError::Http)?;

        let token = match (&self.access_token, &self.user) {
            (Some(access_token), _) => Token {
                access_token: access_token.clone(),
                refresh_token_expires_in: 0,
                // Externally managed tokens are never refreshed here; give
                // them a nominal lifetime so the refresh check stays quiet.
                expires_in: i64::from(u32::MAX),
                refresh_token: String::new(),
            },
            (None, Some(user)) => {
                request_token(
                    &http,
                    &base_url,
                    &[
                        ("grant_type", "password"),
                        ("client_id", &user.client_id),
                        ("client_secret", &user.client_secret),
                        ("username", &user.username),
                        ("password", &user.password),
                    ],
                )
                .await?
            }
            (None, None) => return Err(ProtocolError::AuthenticationFailed.into()),
        };
        let expires_at = token.expires_at(Utc::now());

        let agreement = match self.agreement_id {
            Some(id) => Agreement {
                id,
                checksum: String::new(),
                heating_type: String::new(),
                display_common_name: String::new(),
                display_hardware_version: String::new(),
                display_software_version: String::new(),
                solar: false,
                toonly: false,
            },
            None => {
                select_agreement(
                    fetch_agreements(&http, &base_url, &token.access_token).await?,
                    self.display_common_name.as_deref(),
                )?
            }
        };

        Ok(ToonClient {
            http,
            base_url,
            agreement,
            user: self.user,
            token: RwLock::new(TokenState { token, expires_at }),
            cache: RwLock::new(None),
            cache_ttl: self.cache_ttl.unwrap_or(Self::DEFAULT_CACHE_TTL),
        })
    }
}

async fn request_token(
    http: &Client,
    base_url: &str,
    form: &[(&str, &str)],
) -> Result<Token, Error> {
    let url = format!("{base_url}/token");
    let response = http
        .post(&url)
        .form(form)
        .send()
        .await
        .map_err(ProtocolError::Http)?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
            Err(ProtocolError::AuthenticationFailed.into())
        }
        status if status.is_success() => {
            let body = response.text().await.map_err(ProtocolError::Http)?;
            Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
        }
        status => Err(ProtocolError::UnexpectedStatus {
            status: status.as_u16(),
            endpoint: url,
        }
        .into()),
    }
}

async fn fetch_agreements(
    http: &Client,
    base_url: &str,
    access_token: &str,
) -> Result<Vec<Agreement>, Error> {
    let url = format!("{base_url}/agreements");
    let response = http
        .get(&url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(ProtocolError::Http)?;

    if !response.status().is_success() {
        return Err(ProtocolError::UnexpectedStatus {
            status: response.status().as_u16(),
            endpoint: url,
        }
        .into());
    }
    let body = response.text().await.map_err(ProtocolError::Http)?;
    Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
}

fn select_agreement(
    agreements: Vec<Agreement>,
    display_common_name: Option<&str>,
) -> Result<Agreement, SessionError> {
    if agreements.is_empty() {
        return Err(SessionError::NoAgreements);
    }
    match display_common_name {
        Some(name) => agreements
            .into_iter()
            .find(|agreement| agreement.display_common_name == name)
            .ok_or_else(|| SessionError::AgreementNotFound(name.to_string())),
        None => agreements
            .into_iter()
            .next()
            .ok_or(SessionError::NoAgreements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agreement(id: &str, display: &str) -> Agreement {
        serde_json::from_value(json!({
            "agreementId": id,
            "displayCommonName": display,
        }))
        .unwrap()
    }

    #[test]
    fn select_agreement_takes_first_by_default() {
        let selected = select_agreement(
            vec![agreement("1", "eneco-001-aaa"), agreement("2", "eneco-001-bbb")],
            None,
        )
        .unwrap();
        assert_eq!(selected.id, "1");
    }

    #[test]
    fn select_agreement_by_display_name() {
        let selected = select_agreement(
            vec![agreement("1", "eneco-001-aaa"), agreement("2", "eneco-001-bbb")],
            Some("eneco-001-bbb"),
        )
        .unwrap();
        assert_eq!(selected.id, "2");
    }

    #[test]
    fn select_agreement_unknown_display_name() {
        let result = select_agreement(vec![agreement("1", "eneco-001-aaa")], Some("missing"));
        assert!(matches!(result, Err(SessionError::AgreementNotFound(_))));
    }

    #[test]
    fn select_agreement_empty_list() {
        let result = select_agreement(vec![], None);
        assert!(matches!(result, Err(SessionError::NoAgreements)));
    }

    #[tokio::test]
    async fn connect_without_token_or_credentials_fails() {
        let result = ToonClientBuilder::new().connect().await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::AuthenticationFailed))
        ));
    }

    #[tokio::test]
    async fn preauthorized_session_needs_no_network() {
        let client = ToonClientBuilder::new()
            .with_access_token("token")
            .with_agreement_id("42")
            .with_base_url("http://localhost:1")
            .connect()
            .await
            .unwrap();
        assert_eq!(client.api_url(), "http://localhost:1/42");
        assert_eq!(client.access_token(), "token");
    }
}
