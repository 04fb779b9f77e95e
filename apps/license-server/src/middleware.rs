// [apps/license-server/src/middleware.rs]
//! Wires the generic admission guard from `keyforge-infra-middleware`
//! to this binary's state and allow-list.

use keyforge_infra_middleware::{AdmissionConfig, AdmissionState};

use crate::state::AppState;

/// Allow-listed bootstrap endpoints (spec.md §4.E): activation, health,
/// the status page, and the two network self-test routes.
///
/// `/api/validate-license` is added here too: its entire purpose is
/// reporting ConfigMissing/CorruptOrTampered/expired before a usable
/// record exists, which the admission gate would otherwise preempt with
/// its own 403 — spec.md §4.E names four allow-listed routes without
/// naming this one, so this is a gap the validation endpoint's own
/// contract (404/401/403/200 on its own terms) requires closing.
const ALLOW_LIST: &[&str] = &[
    "/api/activate-license",
    "/api/validate-license",
    "/api/health",
    "/license/status/all",
    "/api/net/self-test/udp",
    "/api/net/self-test/mdns",
];

pub fn build_admission_state(app_state: &AppState) -> AdmissionState {
    let config = app_state.config();
    AdmissionState::new(
        app_state.store(),
        app_state.issuer(),
        AdmissionConfig {
            staleness_threshold_secs: config.staleness_threshold_secs,
            skew_threshold_secs: config.skew_threshold_secs,
            allow_list_prefixes: ALLOW_LIST.iter().map(|path| path.to_string()).collect(),
        },
    )
}
