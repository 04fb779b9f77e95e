// [apps/license-server/src/handlers/activation.rs]
//! `/api/activate-license`. Forwards to the upstream issuer and persists
//! the returned record through the vault on success.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::issuer::IssuerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateLicenseRequest {
    pub license_key: String,
}

pub async fn activate_license(
    State(state): State<AppState>,
    Json(request): Json<ActivateLicenseRequest>,
) -> Response {
    if request.license_key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errorCode": "INVALID_PARAMETERS", "message": "licenseKey is required" })),
        )
            .into_response();
    }

    match state.issuer().activate(&request.license_key).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(IssuerError::Unconfigured) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "errorCode": "ISSUER_UNCONFIGURED", "message": "no upstream issuer configured" })),
        )
            .into_response(),
        Err(IssuerError::Transport(error)) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "errorCode": "RESYNC_FAILED", "message": error.to_string() })),
        )
            .into_response(),
        Err(IssuerError::UpstreamRejected { status, body }) => {
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(body)).into_response()
        }
    }
}
