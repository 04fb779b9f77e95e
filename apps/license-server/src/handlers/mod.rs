// [apps/license-server/src/handlers/mod.rs]
pub mod activation;
pub mod health;
pub mod net_selftest;
pub mod session;
pub mod statement;
pub mod status;
pub mod validate;
