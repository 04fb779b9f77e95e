// [libs/infra-middleware/src/collaborators.rs]
//! The two collaborators the admission guard needs but must not know how
//! to implement (spec.md §9 Design Notes: "preserve this contract as a
//! narrow capability type"). `apps/license-server::issuer::IssuerClient`
//! is the production implementation; tests substitute a mock that never
//! touches the network.

use async_trait::async_trait;

/// Resync failed — the issuer was unreachable or rejected the refresh.
/// The guard treats any variant identically: respond 403.
#[derive(Debug, thiserror::Error)]
#[error("resync failed: {0}")]
pub struct ResyncFailure(pub String);

#[async_trait]
pub trait AdmissionCollaborators: Send + Sync {
    /// Refreshes the license record from the upstream issuer and persists
    /// it through the vault. Called when the staleness threshold is
    /// exceeded (spec.md §4.E step 2).
    async fn resync(&self) -> Result<(), ResyncFailure>;

    /// Fire-and-forget notification that clock skew was observed. The
    /// guard spawns this rather than awaiting it inline, so an
    /// implementation that itself blocks on I/O still never delays the
    /// rejecting response (spec.md §4.E step 3).
    async fn report_clock_tampering(&self, observed_skew_secs: i64);
}
