// [libs/infra-middleware/src/guard.rs]
//! The admission gate (component E). Runs before every handler except the
//! allow-listed bootstrap endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use keyforge_core_vault::LicenseStore;
use keyforge_domain_models::monotonic_now_ms;
use serde_json::json;
use tracing::{debug, warn};

use crate::collaborators::AdmissionCollaborators;

#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    pub staleness_threshold_secs: i64,
    pub skew_threshold_secs: i64,
    /// Case-insensitive path prefixes that bypass every check (spec.md
    /// §4.E: activation, health, status page, the two self-test routes).
    pub allow_list_prefixes: Vec<String>,
}

impl AdmissionConfig {
    fn path_is_allow_listed(&self, path: &str) -> bool {
        let lowered = path.to_ascii_lowercase();
        self.allow_list_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(&prefix.to_ascii_lowercase()))
    }
}

#[derive(Clone)]
pub struct AdmissionState {
    store: Arc<LicenseStore>,
    collaborators: Arc<dyn AdmissionCollaborators>,
    config: Arc<AdmissionConfig>,
}

impl AdmissionState {
    pub fn new(
        store: Arc<LicenseStore>,
        collaborators: Arc<dyn AdmissionCollaborators>,
        config: AdmissionConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            config: Arc::new(config),
        }
    }
}

fn reject(status: StatusCode, error_code: &str, message: &str) -> Response {
    (status, Json(json!({ "errorCode": error_code, "message": message }))).into_response()
}

/// The four ordered checks of spec.md §4.E. Allow-listed paths bypass all
/// of them and run the handler directly.
pub async fn admission_guard(
    State(state): State<AdmissionState>,
    req: Request,
    next: Next,
) -> Response {
    if state.config.path_is_allow_listed(req.uri().path()) {
        return next.run(req).await;
    }

    // Step 1: record loaded and valid.
    let Some(mut record) = state.store.record() else {
        warn!("admission: no license record loaded");
        return reject(StatusCode::FORBIDDEN, "NO_LICENSE", "license not provisioned");
    };
    if !record.is_valid() {
        warn!("admission: license record failed validity check");
        return reject(StatusCode::FORBIDDEN, "INVALID_LICENSE", "license invalid");
    }

    // Step 2: staleness -> resync.
    let ticks_since_last_sync = monotonic_now_ms() - record.system_up_time;
    if ticks_since_last_sync > state.config.staleness_threshold_secs * 1000 {
        debug!(ticks_since_last_sync, "admission: license stale, resyncing");
        if let Err(error) = state.collaborators.resync().await {
            warn!(%error, "admission: resync failed");
            return reject(
                StatusCode::FORBIDDEN,
                "RESYNC_FAILED",
                "please connect to the network",
            );
        }
        record = match state.store.record() {
            Some(reloaded) => reloaded,
            None => {
                warn!("admission: resync reported success but no record is loaded");
                return reject(
                    StatusCode::FORBIDDEN,
                    "RESYNC_FAILED",
                    "please connect to the network",
                );
            }
        };
    }

    // Step 3: clock skew. Compared against the most recently resynced
    // current_timestamp, refreshed by a successful resync above — not the
    // timestamp from license issuance.
    let wall_now_seconds = Utc::now().timestamp();
    let skew = (wall_now_seconds - record.current_timestamp).abs();
    if skew >= state.config.skew_threshold_secs {
        warn!(skew, "admission: clock skew exceeds threshold");
        let collaborators = Arc::clone(&state.collaborators);
        tokio::spawn(async move {
            collaborators.report_clock_tampering(skew).await;
        });
        return reject(
            StatusCode::FORBIDDEN,
            "ACCESS_DENIED",
            "access denied",
        );
    }

    // Step 4: expiry.
    if record.is_expired_at(wall_now_seconds) {
        warn!("admission: license expired");
        return reject(StatusCode::FORBIDDEN, "LICENSE_EXPIRED", "license expired");
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use keyforge_domain_models::LicenseRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct MockCollaborators {
        resync_ok: bool,
        resync_calls: AtomicUsize,
        tamper_reports: AtomicUsize,
    }

    impl MockCollaborators {
        fn new(resync_ok: bool) -> Self {
            Self {
                resync_ok,
                resync_calls: AtomicUsize::new(0),
                tamper_reports: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AdmissionCollaborators for MockCollaborators {
        async fn resync(&self) -> Result<(), crate::collaborators::ResyncFailure> {
            self.resync_calls.fetch_add(1, Ordering::SeqCst);
            if self.resync_ok {
                Ok(())
            } else {
                Err(crate::collaborators::ResyncFailure("unreachable".into()))
            }
        }

        async fn report_clock_tampering(&self, _observed_skew_secs: i64) {
            self.tamper_reports.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> AdmissionConfig {
        AdmissionConfig {
            staleness_threshold_secs: 7_200,
            skew_threshold_secs: 600,
            allow_list_prefixes: vec!["/api/health".into(), "/api/activate-license".into()],
        }
    }

    fn fresh_record() -> LicenseRecord {
        let now = Utc::now().timestamp();
        LicenseRecord {
            license_key: "K".into(),
            current_timestamp: now,
            expiry_timestamp: now + 10_000,
            number_of_users: 5,
            number_of_statements: 100,
            role: "standard".into(),
            used_statements: 0,
            system_up_time: monotonic_now_ms(),
        }
    }

    async fn build_app(store: Arc<LicenseStore>, collaborators: Arc<dyn AdmissionCollaborators>) -> Router {
        let state = AdmissionState::new(store, collaborators, config());
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(state, admission_guard))
    }

    #[tokio::test]
    async fn allowed_request_passes_through_with_valid_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        store.replace(fresh_record()).unwrap();
        let app = build_app(store, Arc::new(MockCollaborators::new(true))).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        let app = build_app(store, Arc::new(MockCollaborators::new(true))).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn stale_record_triggers_resync_and_succeeds_on_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        let mut record = fresh_record();
        record.system_up_time = monotonic_now_ms() - 8_000_000; // past the 7200s threshold
        store.replace(record).unwrap();

        let collaborators = Arc::new(MockCollaborators::new(true));
        let app = build_app(store, collaborators.clone()).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(collaborators.resync_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_record_with_failing_resync_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        let mut record = fresh_record();
        record.system_up_time = monotonic_now_ms() - 8_000_000;
        store.replace(record).unwrap();

        let app = build_app(store, Arc::new(MockCollaborators::new(false))).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn clock_skew_rejects_and_fires_tamper_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        let mut record = fresh_record();
        record.current_timestamp -= 10_000; // far beyond the 600s threshold
        store.replace(record).unwrap();

        let collaborators = Arc::new(MockCollaborators::new(true));
        let app = build_app(store, collaborators.clone()).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // the report is spawned, give the runtime a tick to run it
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(collaborators.tamper_reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        let mut record = fresh_record();
        record.expiry_timestamp = record.current_timestamp - 1;
        store.replace(record).unwrap();

        let app = build_app(store, Arc::new(MockCollaborators::new(true))).await;

        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn allow_listed_path_bypasses_all_checks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LicenseStore::new(dir.path().join("l.enc"), "fp"));
        // no record loaded at all
        let state = AdmissionState::new(store, Arc::new(MockCollaborators::new(true)), config());
        let app = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(state, admission_guard));

        let response = app
            .oneshot(HttpRequest::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
