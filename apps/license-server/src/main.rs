// [apps/license-server/src/main.rs]
//! Binary entry point. Loads configuration from the environment, starts
//! telemetry, resolves the local hostname once, and hands off to the
//! kernel's ignition sequence.

use keyforge_license_server::config::Config;
use keyforge_license_server::kernel::LicenseServerKernel;
use keyforge_shared_telemetry::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing("keyforge_license_server");

    let config = Config::from_env();
    let hostname = gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown-host".to_string());

    let kernel = LicenseServerKernel::ignite(config, hostname);
    kernel.run().await;
}
