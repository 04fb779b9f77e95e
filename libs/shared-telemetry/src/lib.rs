// [libs/shared-telemetry/src/lib.rs]
//! =================================================================
//! APARATO: TELEMETRÍA COMPARTIDA (ESTRATO L4/L6)
//! RESPONSABILIDAD: TRAZADO ESTRUCTURADO Y CAPTURA DE PÁNICOS
//! =================================================================

use std::panic;

use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber and panic hook for a binary.
/// Development builds get compact, human-readable output; release builds
/// get flattened JSON for ingestion by a log collector. Panics, including
/// ones in detached background tasks, are logged through `tracing::error!`
/// before unwinding continues.
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,mdns_sd=warn",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    let service_name = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");

        error!(
            target: "panic_monitor",
            service = %service_name,
            location = %location,
            "thread panicked: {payload}"
        );
    }));

    info!(service = %service_name, "telemetry initialized");
}
