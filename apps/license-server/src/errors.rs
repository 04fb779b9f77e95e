// [apps/license-server/src/errors.rs]
//! Maps internal error types to the HTTP status codes and `errorCode`
//! bodies of spec.md §7. No internal error type is ever serialized
//! unqualified into a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyforge_core_pool::PoolError;
use keyforge_core_vault::VaultError;
use serde_json::json;

pub struct ApiError {
    status: StatusCode,
    error_code: &'static str,
    message: String,
    extra: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
            extra: None,
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PARAMETERS", message)
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "errorCode": self.error_code,
            "message": self.message,
        });
        if let (Some(extra), Some(map)) = (self.extra, body.as_object_mut()) {
            if let Some(extra_map) = extra.as_object() {
                for (key, value) in extra_map {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<PoolError> for ApiError {
    fn from(error: PoolError) -> Self {
        let message = error.to_string();
        match error {
            PoolError::CapacityExhausted { sessions, all_active } => {
                ApiError::new(StatusCode::TOO_MANY_REQUESTS, "CAPACITY_EXHAUSTED", message)
                    .with_extra(json!({ "sessions": sessions, "allActive": all_active }))
            }
            PoolError::NotFound => ApiError::new(StatusCode::BAD_REQUEST, "NOT_FOUND", message),
            PoolError::SessionActive => {
                ApiError::new(StatusCode::BAD_REQUEST, "PRECONDITION_FAILED", message)
            }
            PoolError::NoLicenseRecord => {
                ApiError::new(StatusCode::FORBIDDEN, "NO_LICENSE", message)
            }
            PoolError::StatementLimitReached => {
                ApiError::new(StatusCode::BAD_REQUEST, "STATEMENT_LIMIT_REACHED", message)
            }
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(error: VaultError) -> Self {
        match error {
            VaultError::ConfigMissing(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "CONFIG_MISSING", "license not provisioned")
            }
            VaultError::CorruptOrTampered => {
                ApiError::new(StatusCode::UNAUTHORIZED, "CORRUPT_OR_TAMPERED", "license artifact invalid")
            }
            VaultError::NoLoadedRecord => {
                ApiError::new(StatusCode::NOT_FOUND, "NO_LOADED_RECORD", "no license record loaded")
            }
            VaultError::Io(_) | VaultError::Serialization(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error")
            }
        }
    }
}
