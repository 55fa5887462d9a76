pub mod config;
pub mod models;
pub mod db;
pub mod pipeline;
pub mod records;

use tracing_subscriber::EnvFilter;

/// Initialize structured logging for host binaries and integration harnesses.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the crate default.
pub fn init_telemetry() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} v{} starting", config::APP_NAME, config::APP_VERSION);
}
