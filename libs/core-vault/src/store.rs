// [libs/core-vault/src/store.rs]
//! License info store (component C). Construction never touches disk;
//! `load()` is the explicit, fallible step, so `ConfigMissing` and
//! `CorruptOrTampered` are observable `Result` variants to the caller
//! instead of being folded into a boolean flag (Design Notes).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use keyforge_domain_models::{monotonic_now_ms, LicenseRecord};
use tracing::{debug, warn};

use crate::codec;
use crate::errors::VaultError;

/// Which of the two on-disk folder names to use — surfaced as a value
/// resolved once at startup by `apps/license-server::config` rather than
/// read directly from the environment here (Design Notes, spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn folder_name(self) -> &'static str {
        match self {
            Environment::Development => "CyphersolDev",
            Environment::Production => "Cyphersol",
        }
    }
}

/// OS-specific shared (all-users) application-data root, mirroring
/// spec.md §4.C: `/usr/share`, `/Users/Shared`, or the Windows common
/// application-data folder.
pub fn shared_app_data_root() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Users/Shared")
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\ProgramData"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        PathBuf::from("/usr/share")
    }
}

/// Resolves the sealed-artifact path for the given environment, rooted at
/// `shared_root` (normally `shared_app_data_root()`, overridable in tests).
pub fn resolve_artifact_path(environment: Environment, shared_root: &Path) -> PathBuf {
    shared_root.join(environment.folder_name()).join("license.enc")
}

pub struct LicenseStore {
    path: PathBuf,
    fingerprint: String,
    record: RwLock<Option<LicenseRecord>>,
}

impl LicenseStore {
    /// Zero-I/O constructor — the store holds no record until `load()`.
    pub fn new(path: impl Into<PathBuf>, fingerprint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fingerprint: fingerprint.into(),
            record: RwLock::new(None),
        }
    }

    /// Reads, decrypts, and deserializes the sealed artifact. Leaves the
    /// store holding no record (`ConfigMissing`) if the file is absent,
    /// per spec.md §4.C step 2 — this is not an error the caller should
    /// treat as fatal startup failure, only as "every gated endpoint
    /// answers 403 until provisioned."
    pub fn load(&self) -> Result<(), VaultError> {
        if !self.path.exists() {
            return Err(VaultError::ConfigMissing(self.path.display().to_string()));
        }
        let ciphertext = fs::read(&self.path)?;
        let plaintext = codec::open(&ciphertext, &self.fingerprint)?;
        let mut record: LicenseRecord = serde_json::from_slice(&plaintext)?;
        record.system_up_time = monotonic_now_ms();
        *self.record.write().expect("license record lock poisoned") = Some(record);
        debug!("license record loaded and resynced to monotonic epoch");
        Ok(())
    }

    /// Current in-memory record, if any. `IsValid` is re-checked at every
    /// read site rather than cached, since mutation can flip it.
    pub fn record(&self) -> Option<LicenseRecord> {
        self.record
            .read()
            .expect("license record lock poisoned")
            .clone()
    }

    pub fn set_expiry(&self, expiry_timestamp: i64) -> Result<(), VaultError> {
        self.mutate(|record| record.expiry_timestamp = expiry_timestamp)
    }

    pub fn set_server_current_time(&self, current_timestamp: i64) -> Result<(), VaultError> {
        self.mutate(|record| {
            record.current_timestamp = current_timestamp;
            record.system_up_time = monotonic_now_ms();
        })
    }

    /// Invoked only by the session pool's flush path (spec.md §4.D).
    pub fn set_used_statements(&self, used_statements: i64) -> Result<(), VaultError> {
        self.mutate(|record| record.used_statements = used_statements)
    }

    /// Full swap after re-activation. Persists `record` exactly as given —
    /// callers that construct a record from a source with no notion of this
    /// host's monotonic epoch (the issuer's activation response) are
    /// responsible for stamping `system_up_time` themselves; see
    /// `IssuerClient::activate`.
    pub fn replace(&self, record: LicenseRecord) -> Result<(), VaultError> {
        self.persist(&record)?;
        *self.record.write().expect("license record lock poisoned") = Some(record);
        Ok(())
    }

    fn mutate(&self, apply: impl FnOnce(&mut LicenseRecord)) -> Result<(), VaultError> {
        let mut guard = self.record.write().expect("license record lock poisoned");
        match guard.as_mut() {
            Some(record) if !record.license_key.is_empty() => {
                apply(record);
                self.persist(record)?;
                Ok(())
            }
            _ => {
                warn!("mutation attempted with no loaded license record");
                Err(VaultError::NoLoadedRecord)
            }
        }
    }

    fn persist(&self, record: &LicenseRecord) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let plaintext = serde_json::to_vec(record)?;
        let ciphertext = codec::seal(&plaintext, &self.fingerprint);
        fs::write(&self.path, ciphertext)?;
        Ok(())
    }
}
