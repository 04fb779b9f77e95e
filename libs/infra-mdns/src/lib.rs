// [libs/infra-mdns/src/lib.rs]
//! =================================================================
//! APARATO: MDNS SERVICE ANNOUNCER (ESTRATO L4)
//! RESPONSABILIDAD: DESCUBRIMIENTO DE RED SIN CONFIGURACIÓN ESTÁTICA
//! =================================================================

pub mod announcer;
pub mod errors;

pub use announcer::{start, stop, MdnsAnnouncer, DATABASE_SERVICE_TYPE, LICENSE_SERVICE_TYPE};
pub use errors::MdnsError;
