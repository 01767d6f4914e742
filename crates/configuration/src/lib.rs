use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalysisSettings, Config, CorrelationWindow, DataSettings, DuplicatePolicy,
    FetchFailurePolicy, FillPolicy, LoggingSettings, RoundingMode, ServerSettings, TieBreak,
};

/// Prefix of environment variables that override file settings,
/// e.g. `DASHBOARD_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "DASHBOARD";

/// Loads the application configuration from the `config.toml` file.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Reads the configuration file at `path`, layers environment overrides on top,
/// deserializes it into our strongly-typed `Config` struct, and validates it.
///
/// A missing file is not an error; every section has defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.prices_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "data.prices_dir must not be empty".to_string(),
        ));
    }
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port must be non-zero".to_string(),
        ));
    }
    Ok(())
}
