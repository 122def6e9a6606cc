pub mod config;
pub mod models;
pub mod db;
pub mod pipeline; // Schema normalization + field confidence
pub mod review; // Reviewer edits and edit tracking
pub mod accuracy; // Extraction accuracy matrix

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for hosts that do not bring their own.
///
/// Reads `RUST_LOG`, falling back to [`config::default_log_filter`]. Safe to
/// call more than once; later calls leave the first subscriber in place.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(config::LOG_ENV_VAR)
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialised", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
