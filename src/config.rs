use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Yoyaku";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SQLite file name inside the data directory
pub const DATABASE_FILE: &str = "yoyaku.db";

/// Overrides the data directory (tests, portable installs)
pub const DATA_DIR_ENV: &str = "YOYAKU_DATA_DIR";

/// Overrides the license derivation secret
pub const LICENSE_SECRET_ENV: &str = "YOYAKU_LICENSE_SECRET";

/// Secret used when no override is configured. Keys minted by the
/// license generator must be derived from the same value.
pub const DEFAULT_LICENSE_SECRET: &str = "yoyaku_secret_2024";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDirectory,

    #[error("License secret must not be empty")]
    EmptySecret,
}

/// Default tracing filter when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "yoyaku=info,yoyaku_lib=info,warn"
}

/// Get the application data directory
/// ~/.yoyaku/ unless `YOYAKU_DATA_DIR` is set
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(".yoyaku"))
}

/// Runtime configuration threaded through `CoreState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub license_secret: String,
    /// Insert demo patients and today's appointments into an empty ledger.
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn new(data_dir: PathBuf, license_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let license_secret = license_secret.into();
        if license_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            data_dir,
            license_secret,
            seed_demo_data: false,
        })
    }

    /// Build from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var(LICENSE_SECRET_ENV)
            .unwrap_or_else(|_| DEFAULT_LICENSE_SECRET.to_string());
        let mut config = Self::new(app_data_dir()?, secret)?;
        config.seed_demo_data = true;
        Ok(config)
    }

    pub fn with_seed_demo_data(mut self, seed: bool) -> Self {
        self.seed_demo_data = seed;
        self
    }

    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
