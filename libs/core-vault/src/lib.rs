// [libs/core-vault/src/lib.rs]
//! =================================================================
//! APARATO: SEALED LICENSE VAULT (ESTRATO L1, COMPONENTES B + C)
//! RESPONSABILIDAD: CIFRADO SIMÉTRICO Y ALMACÉN DE LICENCIA
//! =================================================================

pub mod codec;
pub mod errors;
pub mod store;

pub use errors::VaultError;
pub use store::{resolve_artifact_path, shared_app_data_root, Environment, LicenseStore};
