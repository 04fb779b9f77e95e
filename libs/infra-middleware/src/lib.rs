// [libs/infra-middleware/src/lib.rs]
//! =================================================================
//! APARATO: ADMISSION GATE (ESTRATO L3)
//! RESPONSABILIDAD: VALIDACIÓN DE VIGENCIA, FRESCURA Y DESFASE DE RELOJ
//! =================================================================

pub mod collaborators;
pub mod guard;

pub use collaborators::{AdmissionCollaborators, ResyncFailure};
pub use guard::{admission_guard, AdmissionConfig, AdmissionState};
