// [libs/infra-udp/src/responder.rs]
//! UDP discovery responder (component G). One datagram socket on a
//! well-known port, exact-match query strings, JSON replies, silent drop
//! of anything else.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DISCOVER_LICENSE_SERVER: &str = "DISCOVER_LICENSE_SERVER";
pub const DISCOVER_POSTGRESQL_SERVER: &str = "DISCOVER_POSTGRESQL_SERVER";

const MAX_DATAGRAM_SIZE: usize = 1024;
const BACKOFF_FLOOR: Duration = Duration::from_secs(1);
const BACKOFF_CEILING: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct LicenseServerAnnouncement<'a> {
    name: &'a str,
    host: &'a str,
    ip: String,
    port: u16,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct PostgresAnnouncement<'a> {
    #[serde(rename = "instanceId")]
    instance_id: &'a str,
    version: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

pub struct UdpResponder {
    name: String,
    host_name: String,
    instance_id: String,
    db_version: String,
    license_port: AtomicU16,
    database_port: AtomicU16,
    database_discovery_enabled: AtomicBool,
    task: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl UdpResponder {
    pub fn new(
        name: impl Into<String>,
        host_name: impl Into<String>,
        instance_id: impl Into<String>,
        db_version: impl Into<String>,
        license_port: u16,
        database_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            instance_id: instance_id.into(),
            db_version: db_version.into(),
            license_port: AtomicU16::new(license_port),
            database_port: AtomicU16::new(database_port),
            database_discovery_enabled: AtomicBool::new(true),
            task: Mutex::new(None),
        }
    }

    pub fn update_license_port(&self, new_port: u16) {
        self.license_port.store(new_port, Ordering::SeqCst);
    }

    pub fn update_database_port(&self, new_port: u16) {
        self.database_port.store(new_port, Ordering::SeqCst);
    }

    pub fn enable_database_discovery(&self) {
        self.database_discovery_enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable_database_discovery(&self) {
        self.database_discovery_enabled.store(false, Ordering::SeqCst);
    }

    fn handle_query(&self, query: &str, local_ip: Ipv4Addr) -> Option<Vec<u8>> {
        match query {
            DISCOVER_LICENSE_SERVER => {
                let announcement = LicenseServerAnnouncement {
                    name: &self.name,
                    host: &self.host_name,
                    ip: local_ip.to_string(),
                    port: self.license_port.load(Ordering::SeqCst),
                    kind: "license-server",
                };
                serde_json::to_vec(&announcement).ok()
            }
            DISCOVER_POSTGRESQL_SERVER if self.database_discovery_enabled.load(Ordering::SeqCst) => {
                let announcement = PostgresAnnouncement {
                    instance_id: &self.instance_id,
                    version: &self.db_version,
                    kind: "postgresql",
                };
                serde_json::to_vec(&announcement).ok()
            }
            _ => None,
        }
    }
}

fn local_ipv4() -> Ipv4Addr {
    get_if_addrs::get_if_addrs()
        .ok()
        .into_iter()
        .flatten()
        .filter(|iface| !iface.is_loopback())
        .find_map(|iface| match iface.addr {
            get_if_addrs::IfAddr::V4(v4) => Some(v4.ip),
            _ => None,
        })
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

/// Binds the socket and spawns the receive loop. Idempotent: a second
/// call while already running returns the existing cancellation token
/// without rebinding.
pub async fn start(
    responder: std::sync::Arc<UdpResponder>,
    bind_port: u16,
) -> std::io::Result<CancellationToken> {
    {
        let guard = responder.task.lock().expect("udp task lock poisoned");
        if let Some((_, token)) = guard.as_ref() {
            return Ok(token.clone());
        }
    }

    let socket = UdpSocket::bind(("0.0.0.0", bind_port)).await?;
    let token = CancellationToken::new();
    let loop_token = token.clone();
    let loop_responder = responder.clone();

    let handle = tokio::spawn(async move {
        info!(port = bind_port, "udp discovery responder started");
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut backoff = BACKOFF_FLOOR;

        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                result = socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, peer)) => {
                            backoff = BACKOFF_FLOOR;
                            let Ok(query) = std::str::from_utf8(&buffer[..len]) else {
                                debug!(%peer, "udp: dropped non-utf8 datagram");
                                continue;
                            };
                            let local_ip = local_ipv4();
                            if let Some(response) = loop_responder.handle_query(query.trim(), local_ip) {
                                if let Err(error) = socket.send_to(&response, peer).await {
                                    warn!(%error, %peer, "udp: failed to send discovery response");
                                }
                            }
                        }
                        Err(error) => {
                            warn!(%error, backoff = ?backoff, "udp: receive error, backing off");
                            tokio::time::sleep(backoff).await;
                            backoff = (backoff * 2).min(BACKOFF_CEILING);
                        }
                    }
                }
            }
        }
        info!("udp discovery responder stopped");
    });

    *responder.task.lock().expect("udp task lock poisoned") = Some((handle, token.clone()));
    Ok(token)
}

/// Idempotent stop: cancels the receive loop and awaits it. A second call
/// with nothing running is a no-op.
pub async fn stop(responder: std::sync::Arc<UdpResponder>) {
    let taken = responder.task.lock().expect("udp task lock poisoned").take();
    if let Some((handle, token)) = taken {
        token.cancel();
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> UdpResponder {
        UdpResponder::new("keyforge", "host-a", "db-1", "16.1", 7890, 5432)
    }

    #[test]
    fn license_query_is_answered_with_expected_fields() {
        let responder = responder();
        let response = responder
            .handle_query(DISCOVER_LICENSE_SERVER, Ipv4Addr::new(192, 168, 1, 10))
            .expect("license query must be answered");
        let parsed: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(parsed["type"], "license-server");
        assert_eq!(parsed["port"], 7890);
        assert_eq!(parsed["ip"], "192.168.1.10");
    }

    #[test]
    fn database_query_is_dropped_when_discovery_disabled() {
        let responder = responder();
        responder.disable_database_discovery();
        assert!(responder
            .handle_query(DISCOVER_POSTGRESQL_SERVER, Ipv4Addr::LOCALHOST)
            .is_none());
    }

    #[test]
    fn database_query_is_answered_when_enabled() {
        let responder = responder();
        let response = responder
            .handle_query(DISCOVER_POSTGRESQL_SERVER, Ipv4Addr::LOCALHOST)
            .expect("database query must be answered when enabled");
        let parsed: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(parsed["type"], "postgresql");
        assert_eq!(parsed["instanceId"], "db-1");
    }

    #[test]
    fn unknown_query_is_dropped_silently() {
        let responder = responder();
        assert!(responder
            .handle_query("SOMETHING_ELSE", Ipv4Addr::LOCALHOST)
            .is_none());
    }

    #[test]
    fn port_updates_are_reflected_in_subsequent_queries() {
        let responder = responder();
        responder.update_license_port(9999);
        let response = responder
            .handle_query(DISCOVER_LICENSE_SERVER, Ipv4Addr::LOCALHOST)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(parsed["port"], 9999);
    }
}
