// [libs/core-pool/src/errors.rs]
use keyforge_domain_models::session::SessionSummary;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    /// `max_users` reached. Carries the inactive-session listing, or — if
    /// none are inactive — the active listing, for the caller to surface
    /// to an administrator (spec.md §4.D, §7 `CapacityExhausted`).
    #[error("CAPACITY_EXHAUSTED: no available licenses")]
    CapacityExhausted {
        sessions: Vec<SessionSummary>,
        all_active: bool,
    },

    /// Unknown session key on activate/deactivate/release/revoke.
    #[error("NOT_FOUND: unknown session key")]
    NotFound,

    /// `revoke` attempted on a session that is currently active.
    #[error("PRECONDITION_FAILED: session is active, cannot revoke")]
    SessionActive,

    /// No license record loaded — statement-quota operations fail closed.
    #[error("NO_LICENSE_RECORD: statement quota is unavailable")]
    NoLicenseRecord,

    /// `used_statements >= number_of_statements` for a bounded license.
    #[error("STATEMENT_LIMIT_REACHED")]
    StatementLimitReached,
}
