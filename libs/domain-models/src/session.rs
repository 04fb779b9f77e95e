// [libs/domain-models/src/session.rs]
//! The `Session` value object and its deterministic key derivation.
//! Ownership of the `Session` table lives entirely in `keyforge-core-pool`;
//! this crate only defines the shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex-encoded SHA-256 digest, stable per (device, user) triple.
pub type SessionKey = String;

/// `SHA-256(lower(uuid) || "::" || lower(hostname) || "::" || lower(clientId))`,
/// rendered as lowercase hex (spec.md §3). `mac_address` and `username` are
/// deliberately excluded — invariant 1 in spec.md §8.
pub fn compute_session_key(uuid: &str, hostname: &str, client_id: &str) -> SessionKey {
    let material = format!(
        "{}::{}::{}",
        uuid.trim().to_lowercase(),
        hostname.trim().to_lowercase(),
        client_id.trim().to_lowercase()
    );
    let digest = Sha256::digest(material.as_bytes());
    hex_lower(&digest)
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_key: SessionKey,
    pub client_id: String,
    pub uuid: String,
    /// Audit-only field; never participates in `SessionKey` derivation
    /// (spec.md §9 Open Question 3).
    pub mac_address: String,
    pub hostname: String,
    pub username: String,
    pub assigned_at: DateTime<Utc>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub active: bool,
}

/// A read-only view used for the 429 capacity listing and the status
/// dashboard — replaces reflection over a private field (Design Notes).
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_key: SessionKey,
    pub client_id: String,
    pub hostname: String,
    pub username: String,
    pub active: bool,
    pub assigned_at: DateTime<Utc>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_key: session.session_key.clone(),
            client_id: session.client_id.clone(),
            hostname: session.hostname.clone(),
            username: session.username.clone(),
            active: session.active,
            assigned_at: session.assigned_at,
            last_heartbeat: session.last_heartbeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_carries_session_fields_without_mac() {
        let session = Session {
            session_key: "deadbeef".into(),
            client_id: "c1".into(),
            uuid: "u1".into(),
            mac_address: "aa:bb:cc:dd:ee:ff".into(),
            hostname: "h1".into(),
            username: "alice".into(),
            assigned_at: Utc::now(),
            last_heartbeat: None,
            active: false,
        };
        let summary = SessionSummary::from(&session);
        assert_eq!(summary.session_key, session.session_key);
        assert_eq!(summary.client_id, session.client_id);
    }

    #[test]
    fn session_key_ignores_case_and_whitespace() {
        let a = compute_session_key("UUID-1", "Host-A", "Client-1");
        let b = compute_session_key(" uuid-1 ", " host-a ", " client-1 ");
        assert_eq!(a, b);
    }

    #[test]
    fn session_key_ignores_mac_and_username() {
        // mac/username aren't parameters at all — this documents the
        // invariant that only uuid/hostname/client_id feed the key.
        let a = compute_session_key("uuid-1", "host-a", "client-1");
        let b = compute_session_key("uuid-1", "host-a", "client-1");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_yield_different_keys() {
        let a = compute_session_key("uuid-1", "host-a", "client-1");
        let b = compute_session_key("uuid-2", "host-a", "client-1");
        assert_ne!(a, b);
    }
}
