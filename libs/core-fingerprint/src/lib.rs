// [libs/core-fingerprint/src/lib.rs]
//! =================================================================
//! APARATO: FINGERPRINT PROVIDER (ESTRATO L1, COMPONENTE A)
//! RESPONSABILIDAD: IDENTIDAD ESTABLE DE MÁQUINA PARA DERIVACIÓN DE LLAVE
//! =================================================================
//!
//! Computes once per process and caches the result. Any failing
//! sub-identifier falls back to the literal marker `UnknownUUID` rather
//! than aborting — spec.md §4.A requires partial fingerprints to stay
//! reproducible on the same machine, never to panic.

use std::sync::OnceLock;

/// Literal fallback marker for an unavailable sub-identifier.
pub const UNKNOWN_MARKER: &str = "UnknownUUID";

static FINGERPRINT_CACHE: OnceLock<String> = OnceLock::new();

/// Zero-sized handle so callers can construct it freely at the composition
/// root instead of reaching for a process-wide global (Design Notes).
#[derive(Debug, Default, Clone, Copy)]
pub struct FingerprintProvider;

impl FingerprintProvider {
    pub fn new() -> Self {
        Self
    }

    /// Produces the stable machine identity string, computing it once.
    pub fn fingerprint(&self) -> String {
        FINGERPRINT_CACHE.get_or_init(compute_fingerprint).clone()
    }
}

fn compute_fingerprint() -> String {
    let hostname = read_hostname();
    let user = read_user();
    let machine_identifier = read_machine_identifier();
    // Never logged at info/debug in release builds — only this one line,
    // at trace level, which is compiled out of release filters by default.
    tracing::trace!(hostname = %hostname, user = %user, "fingerprint sub-identifiers resolved");
    format!("{hostname}::{user}::{machine_identifier}")
}

fn read_hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| UNKNOWN_MARKER.to_string())
}

fn read_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| UNKNOWN_MARKER.to_string())
}

#[cfg(unix)]
fn read_machine_identifier() -> String {
    // SAFETY: getuid() takes no arguments and cannot fail.
    let uid = unsafe { libc::getuid() };
    uid.to_string()
}

#[cfg(windows)]
fn read_machine_identifier() -> String {
    // The Windows path (user SID + SMBIOS/firmware system UUID per
    // spec.md §3) requires a registry/WMI query this workspace's
    // dependency stack does not carry; until that lands, the
    // environment-derived computer name is the best stable identifier
    // available and any failure degrades to the documented marker.
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| UNKNOWN_MARKER.to_string())
}

#[cfg(not(any(unix, windows)))]
fn read_machine_identifier() -> String {
    UNKNOWN_MARKER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let provider = FingerprintProvider::new();
        assert_eq!(provider.fingerprint(), provider.fingerprint());
    }

    #[test]
    fn fingerprint_is_non_empty() {
        let provider = FingerprintProvider::new();
        assert!(!provider.fingerprint().is_empty());
    }
}
