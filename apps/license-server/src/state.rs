// [apps/license-server/src/state.rs]
//! The composition root. `AppState` is a thin `Arc`-wrapped handle so it
//! can be cloned cheaply into every handler and background task.

use std::path::PathBuf;
use std::sync::Arc;

use keyforge_core_fingerprint::FingerprintProvider;
use keyforge_core_pool::SessionPool;
use keyforge_core_vault::{resolve_artifact_path, shared_app_data_root, LicenseStore};
use keyforge_infra_mdns::MdnsAnnouncer;
use keyforge_infra_udp::UdpResponder;

use crate::config::Config;
use crate::issuer::IssuerClient;

struct Inner {
    config: Config,
    fingerprint: String,
    store: Arc<LicenseStore>,
    pool: Arc<SessionPool>,
    issuer: Arc<IssuerClient>,
    mdns: Arc<MdnsAnnouncer>,
    udp: Arc<UdpResponder>,
}

#[derive(Clone)]
pub struct AppState(Arc<Inner>);

impl AppState {
    pub fn new(config: Config, hostname: String) -> Self {
        let path = resolve_artifact_path(config.environment, &shared_app_data_root());
        Self::new_with_artifact_path(config, hostname, path)
    }

    /// Same as `new`, but with the sealed-artifact path supplied directly
    /// instead of resolved from `shared_app_data_root()`. Production code
    /// never calls this; it exists so integration tests can point the
    /// vault at a scratch directory instead of a real OS-shared path.
    pub fn new_with_artifact_path(config: Config, hostname: String, path: PathBuf) -> Self {
        let fingerprint = FingerprintProvider::new().fingerprint().to_string();
        let store = Arc::new(LicenseStore::new(path, fingerprint.clone()));

        let pool = Arc::new(SessionPool::new(config.max_users_fallback, store.clone()));

        let issuer = Arc::new(IssuerClient::new(
            config.issuer_base_url.clone(),
            config.issuer_api_key.clone(),
            fingerprint.clone(),
            hostname.clone(),
            store.clone(),
        ));

        let mdns = Arc::new(
            MdnsAnnouncer::new(hostname.clone()).expect("mdns daemon failed to initialize"),
        );
        let _ = mdns.set_reannounce_interval(config.mdns_reannounce_interval);

        let udp = Arc::new(UdpResponder::new(
            "keyforge-license-server",
            hostname,
            "keyforge-db",
            "16.0",
            config.http_port,
            5_432,
        ));

        Self(Arc::new(Inner {
            config,
            fingerprint,
            store,
            pool,
            issuer,
            mdns,
            udp,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.0.fingerprint
    }

    pub fn store(&self) -> Arc<LicenseStore> {
        self.0.store.clone()
    }

    pub fn pool(&self) -> Arc<SessionPool> {
        self.0.pool.clone()
    }

    pub fn issuer(&self) -> Arc<IssuerClient> {
        self.0.issuer.clone()
    }

    pub fn mdns(&self) -> Arc<MdnsAnnouncer> {
        self.0.mdns.clone()
    }

    pub fn udp(&self) -> Arc<UdpResponder> {
        self.0.udp.clone()
    }
}
