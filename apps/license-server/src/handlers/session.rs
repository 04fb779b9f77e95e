// [apps/license-server/src/handlers/session.rs]
//! `/api/license/assign`, `activate-session`, `deactivate-session`,
//! `release`, `revoke-session`, `validate-session`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub client_id: String,
    pub uuid: String,
    #[serde(default)]
    pub mac_address: String,
    pub hostname: String,
    #[serde(default)]
    pub username: String,
}

impl AssignRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("clientId", &self.client_id)?;
        require_non_empty("uuid", &self.uuid)?;
        require_non_empty("hostname", &self.hostname)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentityRequest {
    pub client_id: String,
    pub uuid: String,
    pub hostname: String,
}

impl SessionIdentityRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("clientId", &self.client_id)?;
        require_non_empty("uuid", &self.uuid)?;
        require_non_empty("hostname", &self.hostname)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub session_key: String,
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_parameters(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    session_key: String,
    already_assigned: bool,
}

pub async fn assign(
    State(state): State<AppState>,
    Json(request): Json<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let outcome = state.pool().try_use(
        &request.client_id,
        &request.uuid,
        &request.mac_address,
        &request.hostname,
        &request.username,
    )?;
    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            session_key: outcome.session.session_key,
            already_assigned: outcome.already_assigned,
        }),
    ))
}

pub async fn activate(
    State(state): State<AppState>,
    Json(request): Json<SessionIdentityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    state
        .pool()
        .activate(&request.client_id, &request.uuid, &request.hostname)?;
    Ok((StatusCode::OK, Json(json!({ "status": "active" }))))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Json(request): Json<SessionIdentityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    state
        .pool()
        .deactivate(&request.client_id, &request.uuid, &request.hostname)?;
    Ok((StatusCode::OK, Json(json!({ "status": "inactive" }))))
}

pub async fn release(
    State(state): State<AppState>,
    Json(request): Json<SessionIdentityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    state
        .pool()
        .release(&request.client_id, &request.uuid, &request.hostname)?;
    Ok((StatusCode::OK, Json(json!({ "status": "released" }))))
}

pub async fn revoke(
    State(state): State<AppState>,
    Json(request): Json<RevokeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty("sessionKey", &request.session_key)?;
    state.pool().revoke(&request.session_key)?;
    Ok((StatusCode::OK, Json(json!({ "status": "revoked" }))))
}

pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<SessionIdentityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let valid = state
        .pool()
        .is_valid(&request.client_id, &request.uuid, &request.hostname);
    let status = if valid { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    Ok((status, Json(json!({ "valid": valid }))))
}
