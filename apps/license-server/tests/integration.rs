// [apps/license-server/tests/integration.rs]
//! End-to-end scenarios from spec.md §8, driven against the in-process
//! axum `Router` with `tower::ServiceExt::oneshot` — no real socket is
//! bound. Scenario 3 (the ten-second flush boundary) and scenario 7 (a
//! live UDP datagram round trip) are intentionally not reproduced here:
//! both require real wall-clock/socket behavior better covered by the
//! unit tests in `core-pool`/`infra-udp` (with an injectable clock/
//! flush interval) than by a literal multi-second integration sleep.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use keyforge_core_vault::Environment;
use keyforge_domain_models::LicenseRecord;
use keyforge_license_server::config::Config;
use keyforge_license_server::routes::build_router;
use keyforge_license_server::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        http_port: 0,
        discovery_port: 0,
        max_users_fallback: 2,
        staleness_threshold_secs: 7_200,
        skew_threshold_secs: 600,
        issuer_base_url: None,
        issuer_api_key: None,
        mdns_reannounce_interval: Duration::from_secs(60),
    }
}

fn licensed_state(max_users: i64, number_of_statements: i64) -> AppState {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.enc");
    // tests are short-lived processes; leaking the tempdir avoids
    // plumbing its guard through every helper call.
    std::mem::forget(dir);

    let state = AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);

    let now = chrono::Utc::now().timestamp();
    let record = LicenseRecord {
        license_key: "K-TEST".to_string(),
        current_timestamp: now,
        expiry_timestamp: now + 100_000,
        number_of_users: max_users,
        number_of_statements,
        role: "standard".to_string(),
        used_statements: 0,
        system_up_time: 0,
    };
    state.store().replace(record).unwrap();
    state
}

async fn post(state: &AppState, path: &str, body: Value) -> (StatusCode, Value) {
    let app = build_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(state: &AppState, path: &str) -> StatusCode {
    let app = build_router(state.clone());
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    response.status()
}

fn session_request(client_id: &str, uuid: &str, mac: &str, hostname: &str, username: &str) -> Value {
    json!({
        "clientId": client_id,
        "uuid": uuid,
        "macAddress": mac,
        "hostname": hostname,
        "username": username,
    })
}

fn identity_request(client_id: &str, uuid: &str, hostname: &str) -> Value {
    json!({ "clientId": client_id, "uuid": uuid, "hostname": hostname })
}

#[tokio::test]
async fn scenario_assign_activate_deactivate_revoke() {
    let state = licensed_state(2, 100);

    let (status, body) = post(
        &state,
        "/api/license/assign",
        session_request("c1", "u1", "m1", "h1", "alice"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_key = body["sessionKey"].as_str().unwrap().to_string();

    let (status, _) = post(
        &state,
        "/api/license/activate-session",
        identity_request("c1", "u1", "h1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &state,
        "/api/license/deactivate-session",
        identity_request("c1", "u1", "h1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &state,
        "/api/license/revoke-session",
        json!({ "sessionKey": session_key }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(state.pool().len(), 0);
}

#[tokio::test]
async fn scenario_capacity_exhaustion_returns_inactive_then_active_listing() {
    let state = licensed_state(1, 100);

    let (status, _) = post(
        &state,
        "/api/license/assign",
        session_request("c1", "u1", "m1", "h1", "a"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &state,
        "/api/license/assign",
        session_request("c2", "u2", "m2", "h2", "b"),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["allActive"], false);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let (status, _) = post(
        &state,
        "/api/license/activate-session",
        identity_request("c1", "u1", "h1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &state,
        "/api/license/assign",
        session_request("c3", "u3", "m3", "h3", "c"),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["allActive"], true);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_statement_quota_blocks_after_limit() {
    let state = licensed_state(5, 3);

    for _ in 0..3 {
        let (status, _) = post(&state, "/api/license/use-statement", json!({})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post(&state, "/api/license/use-statement", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "STATEMENT_LIMIT_REACHED");
    assert_eq!(body["used"], 3);
    assert_eq!(body["remaining"], 0);

    state.pool().flush().unwrap();
    assert_eq!(state.store().record().unwrap().used_statements, 3);
}

#[tokio::test]
async fn scenario_unlimited_statements_never_exhaust() {
    let state = licensed_state(5, -1);

    for _ in 0..1_000 {
        let (status, body) = post(&state, "/api/license/use-statement", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remaining"], i64::MAX);
    }
    assert_eq!(state.pool().used_statements(), 0);
}

#[tokio::test]
async fn validate_session_reflects_pool_membership() {
    let state = licensed_state(2, 100);

    let (status, body) = post(
        &state,
        "/api/license/validate-session",
        identity_request("ghost", "ghost", "ghost"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], false);

    post(
        &state,
        "/api/license/assign",
        session_request("c1", "u1", "m1", "h1", "alice"),
    )
    .await;

    let (status, body) = post(
        &state,
        "/api/license/validate-session",
        identity_request("c1", "u1", "h1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn health_and_status_endpoints_bypass_admission() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.enc");
    std::mem::forget(dir);
    // no license record loaded at all
    let state = AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);

    assert_eq!(get(&state, "/api/health").await, StatusCode::OK);
    assert_eq!(get(&state, "/license/status/all").await, StatusCode::OK);
}

#[tokio::test]
async fn gated_endpoint_without_a_provisioned_license_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.enc");
    std::mem::forget(dir);
    let state = AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);

    let (status, _) = post(
        &state,
        "/api/license/assign",
        session_request("c1", "u1", "m1", "h1", "alice"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn assign_request_missing_required_field_is_rejected() {
    let state = licensed_state(2, 100);

    let (status, body) = post(
        &state,
        "/api/license/assign",
        json!({ "clientId": "", "uuid": "u1", "hostname": "h1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_PARAMETERS");
}
