// [libs/infra-mdns/src/announcer.rs]
//! mDNS service announcer (component F). Keeps a table of announced
//! service profiles and re-announces all of them on a configurable
//! interval via a background daemon, mirroring the teacher's
//! spawn-a-ticking-task-that-logs-and-continues shape.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use keyforge_domain_models::DiscoveryProfile;
use mdns_sd::{ServiceDaemon, ServiceInfo};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::MdnsError;

pub const LICENSE_SERVICE_TYPE: &str = "_license-server._tcp.local.";
pub const DATABASE_SERVICE_TYPE: &str = "_postgresql._tcp.local.";

const DEFAULT_REANNOUNCE_INTERVAL: Duration = Duration::from_secs(60);
const MIN_REANNOUNCE_INTERVAL: Duration = Duration::from_secs(10);

struct Registered {
    profile: DiscoveryProfile,
    fullname: String,
}

pub struct MdnsAnnouncer {
    daemon: ServiceDaemon,
    host_hostname: String,
    profiles: Mutex<HashMap<String, Registered>>,
    reannounce_interval: Mutex<Duration>,
    task: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl MdnsAnnouncer {
    pub fn new(host_hostname: impl Into<String>) -> Result<Self, MdnsError> {
        let daemon = ServiceDaemon::new().map_err(|error| MdnsError::Daemon(error.to_string()))?;
        Ok(Self {
            daemon,
            host_hostname: host_hostname.into(),
            profiles: Mutex::new(HashMap::new()),
            reannounce_interval: Mutex::new(DEFAULT_REANNOUNCE_INTERVAL),
            task: Mutex::new(None),
        })
    }

    pub fn advertise_license_service(&self, port: u16) -> Result<(), MdnsError> {
        let profile = DiscoveryProfile {
            service_type: LICENSE_SERVICE_TYPE.to_string(),
            instance_id: self.host_hostname.clone(),
            port,
            txt_properties: Default::default(),
        };
        self.register(profile)
    }

    pub fn advertise_database_service(
        &self,
        instance_id: &str,
        port: u16,
        version: &str,
    ) -> Result<(), MdnsError> {
        let mut txt_properties = std::collections::BTreeMap::new();
        txt_properties.insert("version".to_string(), version.to_string());
        let profile = DiscoveryProfile {
            service_type: DATABASE_SERVICE_TYPE.to_string(),
            instance_id: instance_id.to_string(),
            port,
            txt_properties,
        };
        self.register(profile)
    }

    /// Idempotent per composite key (`service-type:instance-id:port`):
    /// re-registering an already-announced profile is a no-op.
    fn register(&self, profile: DiscoveryProfile) -> Result<(), MdnsError> {
        let key = profile.composite_key();
        let mut guard = self.profiles.lock().expect("mdns profile lock poisoned");
        if guard.contains_key(&key) {
            debug!(key = %key, "mdns: profile already announced, skipping");
            return Ok(());
        }

        let service_info = self.build_service_info(&profile)?;
        let fullname = service_info.get_fullname().to_string();
        self.daemon
            .register(service_info)
            .map_err(|error| MdnsError::Daemon(error.to_string()))?;

        info!(key = %key, "mdns: service announced");
        guard.insert(key, Registered { profile, fullname });
        Ok(())
    }

    fn build_service_info(&self, profile: &DiscoveryProfile) -> Result<ServiceInfo, MdnsError> {
        let properties: HashMap<String, String> = profile.txt_properties.clone().into_iter().collect();
        let host_name = format!("{}.local.", self.host_hostname);
        ServiceInfo::new(
            &profile.service_type,
            &profile.instance_id,
            &host_name,
            "",
            profile.port,
            properties,
        )
        .map_err(|error| MdnsError::Daemon(error.to_string()))
    }

    pub fn unregister(&self, key: &str) -> Result<(), MdnsError> {
        let mut guard = self.profiles.lock().expect("mdns profile lock poisoned");
        let registered = guard.remove(key).ok_or_else(|| MdnsError::NotFound(key.to_string()))?;
        self.daemon
            .unregister(&registered.fullname)
            .map_err(|error| MdnsError::Daemon(error.to_string()))?;
        info!(key = %key, "mdns: service unregistered");
        Ok(())
    }

    pub fn set_reannounce_interval(&self, interval: Duration) -> Result<(), MdnsError> {
        if interval < MIN_REANNOUNCE_INTERVAL {
            return Err(MdnsError::IntervalTooShort(interval));
        }
        *self.reannounce_interval.lock().expect("interval lock poisoned") = interval;
        Ok(())
    }

    /// Explicit push: re-registers every currently known profile. Failures
    /// on individual profiles are logged and do not abort the remainder.
    pub fn re_announce_all(&self) {
        let snapshot: Vec<DiscoveryProfile> = {
            let guard = self.profiles.lock().expect("mdns profile lock poisoned");
            guard.values().map(|registered| registered.profile.clone()).collect()
        };

        for profile in snapshot {
            let service_info = match self.build_service_info(&profile) {
                Ok(info) => info,
                Err(error) => {
                    warn!(%error, key = %profile.composite_key(), "mdns: re-announce build failed");
                    continue;
                }
            };
            if let Err(error) = self.daemon.register(service_info) {
                warn!(%error, key = %profile.composite_key(), "mdns: re-announce failed");
            }
        }
    }
}

/// Spawns the periodic re-announce daemon. Idempotent: calling `start`
/// again while already running is a no-op. Returns the cancellation token
/// the kernel retains to stop it at shutdown.
pub fn start(announcer: std::sync::Arc<MdnsAnnouncer>) -> CancellationToken {
    let mut task_guard = announcer.task.lock().expect("mdns task lock poisoned");
    if let Some((_, existing_token)) = task_guard.as_ref() {
        return existing_token.clone();
    }

    let token = CancellationToken::new();
    let loop_token = token.clone();
    let loop_announcer = announcer.clone();
    let handle = tokio::spawn(async move {
        info!("mdns: re-announce daemon started");
        loop {
            let interval = *loop_announcer
                .reannounce_interval
                .lock()
                .expect("interval lock poisoned");
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    loop_announcer.re_announce_all();
                }
            }
        }
        info!("mdns: re-announce daemon stopped");
    });

    *task_guard = Some((handle, token.clone()));
    token
}

/// Idempotent stop: cancels the re-announce task, awaits its join handle,
/// clears the profile table, and shuts down the underlying mDNS daemon so
/// a later `start`/`advertise` cycle begins from a clean slate (spec.md
/// §4.F: "closes multicast resources, clears the profile table").
pub async fn stop(announcer: std::sync::Arc<MdnsAnnouncer>) {
    let taken = announcer.task.lock().expect("mdns task lock poisoned").take();
    if let Some((handle, token)) = taken {
        token.cancel();
        let _ = handle.await;
    }

    announcer
        .profiles
        .lock()
        .expect("mdns profile lock poisoned")
        .clear();

    if let Err(error) = announcer.daemon.shutdown() {
        warn!(%error, "mdns: daemon shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reannounce_interval_rejects_values_under_ten_seconds() {
        let announcer = MdnsAnnouncer::new("test-host").unwrap();
        assert!(matches!(
            announcer.set_reannounce_interval(Duration::from_secs(5)),
            Err(MdnsError::IntervalTooShort(_))
        ));
        assert!(announcer.set_reannounce_interval(Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn advertise_license_service_is_idempotent_per_composite_key() {
        let announcer = MdnsAnnouncer::new("test-host").unwrap();
        announcer.advertise_license_service(7890).unwrap();
        announcer.advertise_license_service(7890).unwrap();
        assert_eq!(announcer.profiles.lock().unwrap().len(), 1);
    }

    #[test]
    fn unregister_unknown_key_reports_not_found() {
        let announcer = MdnsAnnouncer::new("test-host").unwrap();
        assert!(matches!(
            announcer.unregister("nonexistent"),
            Err(MdnsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stop_clears_the_profile_table_and_shuts_down_the_daemon() {
        let announcer = std::sync::Arc::new(MdnsAnnouncer::new("test-host").unwrap());
        announcer.advertise_license_service(7890).unwrap();
        assert_eq!(announcer.profiles.lock().unwrap().len(), 1);

        stop(announcer.clone()).await;
        assert_eq!(announcer.profiles.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let announcer = std::sync::Arc::new(MdnsAnnouncer::new("test-host").unwrap());
        stop(announcer.clone()).await;
        stop(announcer).await;
    }
}
