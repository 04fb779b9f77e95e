// [apps/license-server/src/routes.rs]
//! Assembles the endpoint set of spec.md §6 into one axum `Router`. The
//! admission guard (component E) is layered over the entire router; it
//! bypasses allow-listed paths internally rather than this module
//! splitting the tree into guarded/unguarded halves (`middleware.rs`
//! carries that allow-list).

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use keyforge_infra_middleware::admission_guard;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{activation, health, net_selftest, session, statement, status, validate};
use crate::middleware::build_admission_state;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let admission_state = build_admission_state(&state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/activate-license", post(activation::activate_license))
        .route("/api/validate-license", post(validate::validate_license))
        .route("/api/license/assign", post(session::assign))
        .route("/api/license/activate-session", post(session::activate))
        .route("/api/license/deactivate-session", post(session::deactivate))
        .route("/api/license/release", post(session::release))
        .route("/api/license/revoke-session", post(session::revoke))
        .route("/api/license/validate-session", post(session::validate))
        .route("/api/license/use-statement", post(statement::use_statement))
        .route(
            "/api/license/check-statement-limit",
            get(statement::check_statement_limit),
        )
        .route("/license/status/all", get(status::status_all))
        .route("/api/health", get(health::health))
        .route("/api/net/self-test/udp", get(net_selftest::udp_self_test))
        .route("/api/net/self-test/mdns", get(net_selftest::mdns_self_test))
        .layer(axum::middleware::from_fn_with_state(
            admission_state,
            admission_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
