// [apps/license-server/src/handlers/validate.rs]
//! `/api/validate-license`. Reads the sealed artifact and reports expiry
//! without going through the session pool at all.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use keyforge_core_vault::VaultError;
use serde_json::json;

use crate::state::AppState;

pub async fn validate_license(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();
    if let Err(error) = store.load() {
        return match error {
            VaultError::ConfigMissing(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "errorCode": "CONFIG_MISSING", "message": "license not provisioned" })),
            ),
            VaultError::CorruptOrTampered => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errorCode": "CORRUPT_OR_TAMPERED", "message": "license artifact invalid" })),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errorCode": "INTERNAL", "message": "internal error" })),
            ),
        };
    }

    let record = match store.record() {
        Some(record) => record,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "errorCode": "CONFIG_MISSING", "message": "license not provisioned" })),
            )
        }
    };

    let now = Utc::now().timestamp();
    if record.is_expired_at(now) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "errorCode": "EXPIRED", "message": "license expired", "record": record })),
        );
    }

    (StatusCode::OK, Json(json!({ "valid": true, "record": record })))
}
