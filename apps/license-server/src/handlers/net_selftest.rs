// [apps/license-server/src/handlers/net_selftest.rs]
//! The two network self-test endpoints spec.md §4.E refers to without
//! naming: a loopback probe of the UDP responder and the mDNS service
//! table. Part of the admission allow-list.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration};

use crate::state::AppState;

const SELF_TEST_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn udp_self_test(State(state): State<AppState>) -> impl IntoResponse {
    let port = state.config().discovery_port;
    let probe = async {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket
            .send_to(
                keyforge_infra_udp::DISCOVER_LICENSE_SERVER.as_bytes(),
                ("127.0.0.1", port),
            )
            .await?;
        let mut buffer = [0u8; 1024];
        socket.recv_from(&mut buffer).await
    };

    match timeout(SELF_TEST_TIMEOUT, probe).await {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Ok(Err(error)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": error.to_string() })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "udp self-test timed out" })),
        ),
    }
}

pub async fn mdns_self_test(State(state): State<AppState>) -> impl IntoResponse {
    let mdns = state.mdns();
    mdns.re_announce_all();
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
