// [libs/infra-mdns/src/errors.rs]
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdnsError {
    #[error("mDNS daemon error: {0}")]
    Daemon(String),

    #[error("re-announce interval must be at least 10s, got {0:?}")]
    IntervalTooShort(Duration),

    #[error("no mDNS profile registered for key {0}")]
    NotFound(String),
}
