// [apps/license-server/src/handlers/health.rs]
//! `/api/health`. Part of the admission allow-list; answers liveness with
//! a small HTML snippet (spec.md §6: "200 HTML", the one JSON exception
//! besides the status dashboard).

use axum::http::StatusCode;
use axum::response::Html;

pub async fn health() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::OK,
        Html("<html><body><p>OK</p></body></html>"),
    )
}
