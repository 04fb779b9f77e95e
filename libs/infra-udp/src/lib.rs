// [libs/infra-udp/src/lib.rs]
//! =================================================================
//! APARATO: UDP DISCOVERY RESPONDER (ESTRATO L4)
//! RESPONSABILIDAD: DESCUBRIMIENTO DE RED SIN CONFIGURACIÓN ESTÁTICA
//! =================================================================

pub mod responder;

pub use responder::{start, stop, UdpResponder, DISCOVER_LICENSE_SERVER, DISCOVER_POSTGRESQL_SERVER};
