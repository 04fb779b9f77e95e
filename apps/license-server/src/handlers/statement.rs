// [apps/license-server/src/handlers/statement.rs]
//! `/api/license/use-statement`, `/api/license/check-statement-limit`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use keyforge_core_pool::PoolError;
use serde::Serialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    used: i64,
    remaining: i64,
    limit_reached: bool,
}

pub async fn use_statement(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool();
    match pool.try_use_statement() {
        Ok(usage) => Ok((
            StatusCode::OK,
            Json(StatementResponse {
                used: usage.used,
                remaining: usage.remaining,
                limit_reached: pool.is_statement_limit_reached(),
            }),
        )),
        // spec.md §6: the 400 path reports `remaining`/`used` the same
        // way the 200 path does.
        Err(PoolError::StatementLimitReached) => Err(ApiError::from(PoolError::StatementLimitReached)
            .with_extra(json!({
                "used": pool.used_statements(),
                "remaining": pool.remaining_statements(),
                "limitReached": true,
            }))),
        Err(error) => Err(error.into()),
    }
}

pub async fn check_statement_limit(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool();
    (
        StatusCode::OK,
        Json(StatementResponse {
            used: pool.used_statements(),
            remaining: pool.remaining_statements(),
            limit_reached: pool.is_statement_limit_reached(),
        }),
    )
}
