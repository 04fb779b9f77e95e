// [libs/core-vault/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// Decryption or PKCS#7 unpadding failed — a hard, non-retriable fault
    /// (spec.md §4.B/§7). Callers must surface this as an operator action,
    /// never retry.
    #[error("CORRUPT_OR_TAMPERED: sealed artifact failed to decode")]
    CorruptOrTampered,

    /// No sealed artifact present at the resolved path (spec.md §7,
    /// `ConfigMissing`). The store boots anyway with an unloaded record.
    #[error("CONFIG_MISSING: no sealed artifact at {0}")]
    ConfigMissing(String),

    #[error("IO_FAULT: {0}")]
    Io(#[from] std::io::Error),

    #[error("SERIALIZATION_FAULT: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A mutation was attempted (`set_expiry`, `set_server_current_time`)
    /// while no record is loaded or the loaded record has an empty key —
    /// spec.md §4.C precondition on those operations.
    #[error("PRECONDITION_FAILED: no loaded license record to mutate")]
    NoLoadedRecord,
}
