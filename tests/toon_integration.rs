// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the Toon session and device layer using wiremock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use toonr_lib::device::OnOffCapable;
use toonr_lib::records::User;
use toonr_lib::session::Session;
use toonr_lib::types::PowerState;
use toonr_lib::{Error, SessionError, ToonClient};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AGREEMENT_ID: &str = "1";
const DEVICE_UUID: &str = "uuid-1";

fn status_body(current_state: i64, locked: i64) -> serde_json::Value {
    json!({
        "deviceStatusInfo": {"device": [
            {"name": "plug1", "devUUID": DEVICE_UUID, "isConnected": 1,
             "currentState": current_state, "avgUsage": 10.0,
             "currentUsage": 120.0, "dayUsage": 400.0},
        ]},
        "deviceConfigInfo": {"device": [
            {"name": "plug1", "devType": "FGWP011", "position": 3,
             "switchLocked": locked, "usageCapable": 1, "zwUuid": "zw-1"},
        ]},
    })
}

fn device_representation(current_state: i64) -> serde_json::Value {
    json!({
        "devUUID": DEVICE_UUID,
        "name": "plug1",
        "currentState": current_state,
        "isConnected": 1,
        "zwUuid": "zw-1",
        "rgbColor": null,
    })
}

async fn connect(server: &MockServer) -> Arc<ToonClient> {
    Arc::new(
        ToonClient::builder()
            .with_access_token("test-token")
            .with_agreement_id(AGREEMENT_ID)
            .with_base_url(server.uri())
            .connect()
            .await
            .expect("pre-authorized connect needs no network"),
    )
}

// ============================================================================
// Write Path
// ============================================================================

#[tokio::test]
async fn turn_on_issues_get_put_cycle_and_refreshes_cache() {
    let server = MockServer::start().await;

    // First status read: device is off. Consumed exactly once so the
    // post-write re-fetch falls through to the refreshed snapshot below.
    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(0, 0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_representation(0)))
        .expect(1)
        .mount(&server)
        .await;

    // The PUT body must equal the GET body with currentState overwritten.
    Mock::given(method("PUT"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(device_representation(1)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // Refreshed snapshot served after the cache drop.
    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(1, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let plug = client.smart_plug("plug1");

    assert_eq!(plug.switch().power_state().await.unwrap(), PowerState::Off);
    assert!(plug.switch().turn_on().await.unwrap());
    assert_eq!(plug.switch().power_state().await.unwrap(), PowerState::On);
}

#[tokio::test]
async fn locked_device_makes_no_http_calls() {
    let server = MockServer::start().await;

    // Only the status endpoint may be hit, and only once: the denied write
    // must not drop the cache.
    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(0, 1)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let plug = client.smart_plug("plug1");

    assert!(!plug.switch().turn_on().await.unwrap());
    assert_eq!(plug.switch().power_state().await.unwrap(), PowerState::Off);
}

#[tokio::test]
async fn toggle_inverts_the_current_state() {
    let server = MockServer::start().await;

    // Device is on; toggling must PUT currentState 0.
    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(1, 0)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_representation(1)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .and(body_json(device_representation(0)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let switch = client.switch("plug1");

    assert!(switch.toggle().await.unwrap());
}

#[tokio::test]
async fn put_status_is_not_checked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(0, 0)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_representation(0)))
        .mount(&server)
        .await;

    // A failing PUT still counts as success on this API surface.
    Mock::given(method("PUT"))
        .and(path(format!("/{AGREEMENT_ID}/devices/{DEVICE_UUID}")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    assert!(client.switch("plug1").turn_on().await.unwrap());
}

// ============================================================================
// Session and Cache
// ============================================================================

#[tokio::test]
async fn status_is_served_from_cache_within_ttl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(1, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let plug = client.smart_plug("plug1");

    // Several reads, one fetch.
    assert!(plug.switch().is_connected().await.unwrap());
    assert!(plug.usage_capable().await.unwrap());
    assert_eq!(plug.current_usage().await.unwrap(), 120.0);
}

#[tokio::test]
async fn expired_cache_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(1, 0)))
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(
        ToonClient::builder()
            .with_access_token("test-token")
            .with_agreement_id(AGREEMENT_ID)
            .with_base_url(server.uri())
            .with_cache_ttl(Duration::ZERO)
            .connect()
            .await
            .unwrap(),
    );

    let switch = client.switch("plug1");
    assert!(switch.is_connected().await.unwrap());
    assert!(switch.is_connected().await.unwrap());
}

#[tokio::test]
async fn status_not_ready_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let result = client.status().await;
    assert!(matches!(
        result,
        Err(Error::Session(SessionError::StatusNotReady))
    ));
}

#[tokio::test]
async fn typed_snapshot_readers() {
    let server = MockServer::start().await;

    let mut body = status_body(1, 0);
    body["gasUsage"] = json!({"avgDayValue": 100, "dayUsage": 20, "meterReading": 1234});
    body["powerUsage"] = json!({"value": 420, "dayUsage": 5500, "maxSolar": 1500,
                                "valueProduced": 740});
    body["thermostatInfo"] = json!({"activeState": 1, "currentSetpoint": 1850,
                                    "currentDisplayTemp": 1822, "errorFound": 255});
    body["thermostatStates"] = json!({"state": [
        {"id": 0, "tempValue": 2000, "dhw": 1},
        {"id": 3, "tempValue": 1500, "dhw": 0},
    ]});
    body["smokeDetectors"] = json!({"device": [
        {"devUuid": "sd-1", "name": "Hallway", "connected": 1, "batteryLevel": 80,
         "type": "FGSD002"},
    ]});

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;

    let gas = client.gas_usage().await.unwrap().unwrap();
    assert_eq!(gas.meter_reading, 1234.0);

    let power = client.power_usage().await.unwrap().unwrap();
    assert_eq!(power.usage.value, 420.0);

    let solar = client.solar().await.unwrap().unwrap();
    assert_eq!(solar.maximum, 1500.0);
    assert_eq!(solar.produced, 740.0);

    let info = client.thermostat_info().await.unwrap().unwrap();
    assert_eq!(info.current_set_point, 1850.0);

    let states = client.thermostat_states().await.unwrap();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].name(), "comfort");

    let detectors = client.smoke_detectors().await.unwrap();
    assert_eq!(detectors[0].name, "Hallway");
}

#[tokio::test]
async fn device_discovery_by_config_type() {
    let server = MockServer::start().await;

    let body = json!({
        "deviceStatusInfo": {"device": [
            {"name": "plug1", "devUUID": "u1"},
            {"name": "lamp", "devUUID": "u2"},
        ]},
        "deviceConfigInfo": {"device": [
            {"name": "plug1", "devType": "FGWP011"},
            {"name": "lamp", "devType": "hue_light"},
        ]},
    });

    Mock::given(method("GET"))
        .and(path(format!("/{AGREEMENT_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = connect(&server).await;

    let plugs = client.smart_plugs().await.unwrap();
    assert_eq!(plugs.len(), 1);
    assert_eq!(plugs[0].name(), "plug1");

    let lights = client.lights().await.unwrap();
    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].name(), "lamp");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn password_grant_and_agreement_discovery() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "granted-token",
            "refresh_token_expires_in": "604800",
            "expires_in": "10800",
            "refresh_token": "refresh-me",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/agreements"))
        .and(header("authorization", "Bearer granted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"agreementId": "42", "displayCommonName": "eneco-001-aaa"},
            {"agreementId": "43", "displayCommonName": "eneco-001-bbb"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let user = User {
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        username: "user@example.com".into(),
        password: "hunter2".into(),
    };
    let client = ToonClient::builder()
        .with_credentials(user)
        .with_display("eneco-001-bbb")
        .with_base_url(server.uri())
        .connect()
        .await
        .unwrap();

    assert_eq!(client.agreement().id, "43");
    assert_eq!(client.access_token(), "granted-token");
    assert_eq!(client.api_url(), format!("{}/43", server.uri()));
}

#[tokio::test]
async fn rejected_credentials_fail_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let user = User {
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        username: "user@example.com".into(),
        password: "wrong".into(),
    };
    let result = ToonClient::builder()
        .with_credentials(user)
        .with_base_url(server.uri())
        .connect()
        .await;

    assert!(matches!(
        result,
        Err(Error::Protocol(
            toonr_lib::ProtocolError::AuthenticationFailed
        ))
    ));
}
