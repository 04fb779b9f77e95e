// [libs/domain-models/src/lib.rs]
//! =================================================================
//! APARATO: DOMAIN VALUE TYPES (ESTRATO L1)
//! RESPONSABILIDAD: TIPOS DE VALOR PUROS COMPARTIDOS, SIN I/O
//! =================================================================

pub mod clock;
pub mod discovery;
pub mod license;
pub mod session;

pub use clock::monotonic_now_ms;
pub use discovery::DiscoveryProfile;
pub use license::LicenseRecord;
pub use session::{Session, SessionKey};
