// [libs/core-pool/src/pool.rs]
//! Session pool and statement-quota counter (component D). A single
//! `Mutex<HashMap<..>>` backs the session table — spec.md §5 mandates one
//! exclusive critical section per operation over the map, which a sharded
//! concurrent map would not give the capacity invariant (spec.md §8,
//! invariant 2: `|pool| <= max_users` at all times).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use keyforge_core_vault::LicenseStore;
use keyforge_domain_models::session::{compute_session_key, SessionSummary};
use keyforge_domain_models::Session;
use tracing::{debug, info, warn};

use crate::errors::PoolError;

/// Flush is due after this many seconds since the last successful flush
/// (spec.md §4.D `try_use_statement`).
const FLUSH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TryUseOutcome {
    pub session: Session,
    /// `true` when the session already existed for this key — the caller
    /// surfaces spec.md's "already assigned" message in that case.
    pub already_assigned: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct StatementUsage {
    pub used: i64,
    pub remaining: i64,
}

pub struct SessionPool {
    sessions: Mutex<HashMap<String, Session>>,
    active_count: AtomicUsize,
    max_users: AtomicUsize,
    used_statements: AtomicI64,
    last_flush: Mutex<Instant>,
    store: Arc<LicenseStore>,
}

impl SessionPool {
    pub fn new(max_users: usize, store: Arc<LicenseStore>) -> Self {
        let seeded_used_statements = store
            .record()
            .map(|record| record.used_statements)
            .unwrap_or(0);
        Self {
            sessions: Mutex::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            max_users: AtomicUsize::new(max_users),
            used_statements: AtomicI64::new(seeded_used_statements),
            last_flush: Mutex::new(Instant::now()),
            store,
        }
    }

    /// Overrides the capacity used while no license record is loaded yet.
    /// Once a record loads, `number_of_users` on that record is the
    /// authoritative capacity (spec.md §3: "the pool capacity") and this
    /// fallback is no longer consulted — see `effective_max_users`.
    pub fn set_max_users(&self, max_users: usize) {
        self.max_users.store(max_users, Ordering::SeqCst);
    }

    /// The capacity enforced by `try_use`: the loaded license record's
    /// `number_of_users` when one is loaded, else the constructor-supplied
    /// fallback. Negative/zero values on a loaded record (which `IsValid`
    /// should already have excluded) fall back rather than permit zero
    /// or unbounded capacity.
    fn effective_max_users(&self) -> usize {
        match self.store.record() {
            Some(record) if record.number_of_users > 0 => record.number_of_users as usize,
            _ => self.max_users.load(Ordering::SeqCst),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session map lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn try_use(
        &self,
        client_id: &str,
        uuid: &str,
        mac_address: &str,
        hostname: &str,
        username: &str,
    ) -> Result<TryUseOutcome, PoolError> {
        let key = compute_session_key(uuid, hostname, client_id);
        let mut guard = self.sessions.lock().expect("session map lock poisoned");

        if let Some(existing) = guard.get(&key) {
            debug!(session_key = %key, "try_use: already assigned");
            return Ok(TryUseOutcome {
                session: existing.clone(),
                already_assigned: true,
            });
        }

        if guard.len() >= self.effective_max_users() {
            let inactive = list_filtered(&guard, false);
            let (sessions, all_active) = if inactive.is_empty() {
                (list_filtered(&guard, true), true)
            } else {
                (inactive, false)
            };
            warn!(pool_size = guard.len(), "try_use: capacity exhausted");
            return Err(PoolError::CapacityExhausted {
                sessions,
                all_active,
            });
        }

        let now = Utc::now();
        let session = Session {
            session_key: key.clone(),
            client_id: client_id.to_string(),
            uuid: uuid.to_string(),
            mac_address: mac_address.to_string(),
            hostname: hostname.to_string(),
            username: username.to_string(),
            assigned_at: now,
            last_heartbeat: Some(now),
            active: false,
        };
        guard.insert(key, session.clone());
        info!(pool_size = guard.len(), "try_use: new session assigned");
        Ok(TryUseOutcome {
            session,
            already_assigned: false,
        })
    }

    pub fn activate(
        &self,
        client_id: &str,
        uuid: &str,
        hostname: &str,
    ) -> Result<(), PoolError> {
        let key = compute_session_key(uuid, hostname, client_id);
        let mut guard = self.sessions.lock().expect("session map lock poisoned");
        match guard.get_mut(&key) {
            Some(session) => {
                let was_active = session.active;
                session.active = true;
                session.last_heartbeat = Some(Utc::now());
                if !was_active {
                    self.active_count.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
            None => Err(PoolError::NotFound),
        }
    }

    pub fn deactivate(
        &self,
        client_id: &str,
        uuid: &str,
        hostname: &str,
    ) -> Result<(), PoolError> {
        let key = compute_session_key(uuid, hostname, client_id);
        let mut guard = self.sessions.lock().expect("session map lock poisoned");
        match guard.get_mut(&key) {
            Some(session) => {
                let was_active = session.active;
                session.active = false;
                if was_active {
                    self.active_count.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(())
            }
            None => Err(PoolError::NotFound),
        }
    }

    pub fn release(&self, client_id: &str, uuid: &str, hostname: &str) -> Result<(), PoolError> {
        let key = compute_session_key(uuid, hostname, client_id);
        let mut guard = self.sessions.lock().expect("session map lock poisoned");
        match guard.remove(&key) {
            Some(session) => {
                if session.active {
                    self.active_count.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(())
            }
            None => Err(PoolError::NotFound),
        }
    }

    pub fn revoke(&self, session_key: &str) -> Result<(), PoolError> {
        let mut guard = self.sessions.lock().expect("session map lock poisoned");
        match guard.get(session_key) {
            None => Err(PoolError::NotFound),
            Some(session) if session.active => Err(PoolError::SessionActive),
            Some(_) => {
                guard.remove(session_key);
                Ok(())
            }
        }
    }

    pub fn is_valid(&self, client_id: &str, uuid: &str, hostname: &str) -> bool {
        let key = compute_session_key(uuid, hostname, client_id);
        self.sessions
            .lock()
            .expect("session map lock poisoned")
            .contains_key(&key)
    }

    pub fn list_active(&self) -> Vec<SessionSummary> {
        list_filtered(&self.sessions.lock().expect("session map lock poisoned"), true)
    }

    pub fn list_inactive(&self) -> Vec<SessionSummary> {
        list_filtered(&self.sessions.lock().expect("session map lock poisoned"), false)
    }

    pub fn list_all(&self) -> Vec<SessionSummary> {
        self.sessions
            .lock()
            .expect("session map lock poisoned")
            .values()
            .map(SessionSummary::from)
            .collect()
    }

    /// Consumes one unit of statement quota. Unlimited licenses
    /// (`number_of_statements == -1`) always succeed without mutating the
    /// counter (spec.md §4.D).
    pub fn try_use_statement(&self) -> Result<StatementUsage, PoolError> {
        let record = self.store.record().ok_or(PoolError::NoLicenseRecord)?;

        if record.statements_unlimited() {
            return Ok(StatementUsage {
                used: self.used_statements.load(Ordering::SeqCst),
                remaining: i64::MAX,
            });
        }

        loop {
            let current = self.used_statements.load(Ordering::SeqCst);
            if current >= record.number_of_statements {
                return Err(PoolError::StatementLimitReached);
            }
            if self
                .used_statements
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }

        self.flush_if_due();

        let used = self.used_statements.load(Ordering::SeqCst);
        Ok(StatementUsage {
            used,
            remaining: (record.number_of_statements - used).max(0),
        })
    }

    /// Fails closed (`true`) when no license record is loaded at all.
    pub fn is_statement_limit_reached(&self) -> bool {
        match self.store.record() {
            None => true,
            Some(record) if record.statements_unlimited() => false,
            Some(record) => self.used_statements.load(Ordering::SeqCst) >= record.number_of_statements,
        }
    }

    pub fn used_statements(&self) -> i64 {
        self.used_statements.load(Ordering::SeqCst)
    }

    pub fn remaining_statements(&self) -> i64 {
        match self.store.record() {
            None => 0,
            Some(record) if record.statements_unlimited() => i64::MAX,
            Some(record) => (record.number_of_statements - self.used_statements.load(Ordering::SeqCst)).max(0),
        }
    }

    fn flush_if_due(&self) {
        let mut last_flush = self.last_flush.lock().expect("last-flush lock poisoned");
        if last_flush.elapsed() >= FLUSH_INTERVAL {
            if let Err(error) = self.flush_locked() {
                warn!(%error, "periodic statement flush failed");
            }
            *last_flush = Instant::now();
        }
    }

    /// Writes `used_statements` into the license record and rewrites the
    /// sealed artifact. Called periodically from `try_use_statement` and
    /// once more, unconditionally, at shutdown.
    pub fn flush(&self) -> Result<(), keyforge_core_vault::VaultError> {
        let result = self.flush_locked();
        *self.last_flush.lock().expect("last-flush lock poisoned") = Instant::now();
        result
    }

    fn flush_locked(&self) -> Result<(), keyforge_core_vault::VaultError> {
        let used = self.used_statements.load(Ordering::SeqCst);
        self.store.set_used_statements(used)
    }
}

fn list_filtered(map: &HashMap<String, Session>, active: bool) -> Vec<SessionSummary> {
    map.values()
        .filter(|session| session.active == active)
        .map(SessionSummary::from)
        .collect()
}
