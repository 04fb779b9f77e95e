// [apps/license-server/src/config.rs]
//! The sole `std::env` reader in the workspace. Every other subsystem
//! receives its configuration as constructor arguments.

use keyforge_core_vault::Environment;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub http_port: u16,
    pub discovery_port: u16,
    pub max_users_fallback: usize,
    pub staleness_threshold_secs: i64,
    pub skew_threshold_secs: i64,
    pub issuer_base_url: Option<String>,
    pub issuer_api_key: Option<String>,
    pub mdns_reannounce_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            environment: match std::env::var("DOTNET_ENVIRONMENT").as_deref() {
                Ok("Development") => Environment::Development,
                _ => Environment::Production,
            },
            http_port: env_parsed("LICENSE_HTTP_PORT", 7_890),
            discovery_port: env_parsed("LICENSE_DISCOVERY_PORT", 41_234),
            max_users_fallback: env_parsed("LICENSE_MAX_USERS_FALLBACK", 1),
            staleness_threshold_secs: env_parsed("LICENSE_STALENESS_THRESHOLD_SECS", 7_200),
            skew_threshold_secs: env_parsed("LICENSE_SKEW_THRESHOLD_SECS", 600),
            issuer_base_url: std::env::var("LICENSE_ISSUER_BASE_URL").ok(),
            issuer_api_key: std::env::var("LICENSE_ISSUER_API_KEY").ok(),
            mdns_reannounce_interval: Duration::from_secs(env_parsed(
                "LICENSE_MDNS_REANNOUNCE_SECS",
                60,
            )),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
