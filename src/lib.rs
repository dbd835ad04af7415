pub mod agenda; // Daily agenda, delay estimate, state transitions
pub mod clock;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod db;
pub mod events; // UI notifications
pub mod license; // Perpetual license + update window
pub mod messages;
pub mod models;
pub mod seed;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Startup for the desktop shell: logging, configuration from the
/// environment, database open and migration, demo data on first run.
pub fn run() -> Result<CoreState, CoreError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let state = CoreState::open(&config)?;

    if state.requires_activation()? {
        tracing::info!("No license configured yet");
    }
    Ok(state)
}
