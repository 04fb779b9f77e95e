// [apps/license-server/src/lib.rs]
//! =================================================================
//! APARATO: LICENSE SERVER BINARY (ESTRATO L5)
//! RESPONSABILIDAD: COMPOSICIÓN RAÍZ Y SUPERFICIE HTTP DE CONTROL
//! =================================================================
//!
//! Wires components A-G (the workspace's `libs/*` crates) into the HTTP
//! control surface (component H) spec.md §4.H describes. The binary
//! entry point lives in `main.rs`; this crate exists so integration
//! tests can build a router against an in-memory `AppState` without
//! going through `main`.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod issuer;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod state;
