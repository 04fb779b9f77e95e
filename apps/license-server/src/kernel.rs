// [apps/license-server/src/kernel.rs]
//! The composition root's ignition sequence: builds `AppState`, starts
//! the background daemons (mDNS re-announce, UDP discovery responder),
//! binds the HTTP listener, and serves until a shutdown signal arrives.
//! On shutdown, every spawned task is cancelled and joined, and the
//! session pool performs its final synchronous flush (spec.md §5
//! "Cancellation").

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use keyforge_core_vault::VaultError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

pub struct LicenseServerKernel {
    state: AppState,
}

impl LicenseServerKernel {
    /// Builds the composition root. Loads the sealed artifact from disk if
    /// one is present (spec.md §4.C step 3) before binding any socket.
    /// A missing artifact is not fatal — the core boots with an unloaded
    /// record and every gated endpoint answers 403 until provisioned. A
    /// corrupt or tampered artifact is logged loudly and left unloaded for
    /// the same reason; the operator must re-provision, the process must
    /// not crash on it.
    pub fn ignite(config: Config, hostname: String) -> Self {
        let state = AppState::new(config, hostname);
        load_artifact_at_boot(&state);
        Self { state }
    }

    /// Starts the background daemons, binds the HTTP listener, and
    /// serves until `ctrl_c` (or an equivalent host signal) arrives.
    pub async fn run(self) {
        let config = self.state.config().clone();

        let mdns = self.state.mdns();
        if let Err(error) = mdns.advertise_license_service(config.http_port) {
            warn!(%error, "kernel: failed to register the license mDNS service");
        }
        let mdns_token = keyforge_infra_mdns::start(mdns.clone());

        let udp = self.state.udp();
        let udp_token = match keyforge_infra_udp::start(udp.clone(), config.discovery_port).await {
            Ok(token) => token,
            Err(error) => {
                error!(%error, "kernel: failed to bind the UDP discovery socket");
                CancellationToken::new()
            }
        };

        let bind_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.http_port);
        let router = build_router(self.state.clone());

        let listener = match tokio::net::TcpListener::bind(bind_address).await {
            Ok(listener) => listener,
            Err(error) => {
                error!(%error, %bind_address, "kernel: failed to bind the HTTP listener");
                Self::shutdown_daemons(mdns_token, udp_token, &self.state).await;
                return;
            }
        };

        info!(%bind_address, "kernel: license server listening");

        let shutdown_signal = shutdown_signal();
        if let Err(error) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            error!(%error, "kernel: http server exited with an error");
        }

        Self::shutdown_daemons(mdns_token, udp_token, &self.state).await;
    }

    async fn shutdown_daemons(
        mdns_token: CancellationToken,
        udp_token: CancellationToken,
        state: &AppState,
    ) {
        info!("kernel: shutdown signal received, draining background daemons");
        mdns_token.cancel();
        keyforge_infra_mdns::stop(state.mdns()).await;
        udp_token.cancel();
        keyforge_infra_udp::stop(state.udp()).await;

        if let Err(error) = state.pool().flush() {
            warn!(%error, "kernel: final statement flush at shutdown failed");
        }
        info!("kernel: shutdown complete");
    }
}

/// Loads the sealed artifact into `state`'s vault, if one exists. A
/// missing artifact is not fatal (`VaultError::ConfigMissing`) — the core
/// boots with an unloaded record and every gated endpoint answers 403
/// until provisioned. A corrupt or tampered artifact is logged loudly and
/// left unloaded for the same reason: the operator must re-provision, the
/// process must not crash on it (spec.md §4.C step 3, §7).
fn load_artifact_at_boot(state: &AppState) {
    match state.store().load() {
        Ok(()) => info!("kernel: sealed license artifact loaded from disk"),
        Err(VaultError::ConfigMissing(path)) => {
            debug!(path, "kernel: no sealed license artifact yet, booting unprovisioned")
        }
        Err(error) => {
            error!(%error, "kernel: sealed license artifact is corrupt or tampered; every gated endpoint will 403 until resolved")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyforge_core_vault::Environment;
    use keyforge_domain_models::LicenseRecord;

    fn test_config() -> Config {
        Config {
            environment: Environment::Development,
            http_port: 0,
            discovery_port: 0,
            max_users_fallback: 1,
            staleness_threshold_secs: 7_200,
            skew_threshold_secs: 600,
            issuer_base_url: None,
            issuer_api_key: None,
            mdns_reannounce_interval: std::time::Duration::from_secs(60),
        }
    }

    #[test]
    fn boot_with_no_artifact_leaves_store_unloaded_but_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.enc");
        let state = AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);

        load_artifact_at_boot(&state);
        assert!(state.store().record().is_none());
    }

    #[test]
    fn boot_with_a_previously_sealed_artifact_loads_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.enc");

        // Simulate a prior process run: seal and write the artifact, then
        // drop the store without keeping it in memory.
        let seeding_state =
            AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path.clone());
        seeding_state
            .store()
            .replace(LicenseRecord {
                license_key: "K-PERSISTED".into(),
                current_timestamp: 1_000,
                expiry_timestamp: 999_999,
                number_of_users: 3,
                number_of_statements: 50,
                role: "standard".into(),
                used_statements: 7,
                system_up_time: 0,
            })
            .unwrap();

        // Fresh state, as if the process had just restarted.
        let restarted_state =
            AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);
        assert!(restarted_state.store().record().is_none());

        load_artifact_at_boot(&restarted_state);
        let record = restarted_state.store().record().expect("artifact should load at boot");
        assert_eq!(record.license_key, "K-PERSISTED");
        assert_eq!(record.used_statements, 7);
    }

    #[test]
    fn boot_with_a_corrupt_artifact_does_not_panic_and_leaves_store_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.enc");
        std::fs::write(&path, b"not a valid sealed artifact").unwrap();

        let state = AppState::new_with_artifact_path(test_config(), "test-host".to_string(), path);
        load_artifact_at_boot(&state);
        assert!(state.store().record().is_none());
    }
}
