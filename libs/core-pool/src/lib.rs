// [libs/core-pool/src/lib.rs]
//! =================================================================
//! APARATO: CONCURRENT SESSION POOL (ESTRATO L2)
//! RESPONSABILIDAD: CUPO DE SESIONES Y CONTADOR DE STATEMENTS
//! =================================================================

pub mod errors;
pub mod pool;

pub use errors::PoolError;
pub use pool::{SessionPool, StatementUsage, TryUseOutcome};
