pub mod config;
pub mod error;
pub mod http;
pub mod location;

pub use config::{BackendConfig, Config, StorageConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, FetchError, PersistenceError, ReqwestErrorExt};
pub use location::Location;

use anyhow::Result;

/// Initialize tracing for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("WeatherNow core initialized");
    Ok(())
}
