use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, DataSettings, EngineSettings, LogFormat, LoggingSettings, ServerSettings,
    SolverSettings,
};

/// The configuration file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "meridian.toml";

/// Prefix for environment overrides, e.g. `MERIDIAN__ENGINE__BASE_CURRENCY=USD`.
pub const ENV_PREFIX: &str = "MERIDIAN";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at `path`
/// (or `meridian.toml`; a missing file is not an error), then `MERIDIAN__*`
/// environment variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    validate(config)
}

/// Checks cross-field constraints and normalizes values.
pub fn validate(mut config: Config) -> Result<Config, ConfigError> {
    let currency = config.engine.base_currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::ValidationError(format!(
            "engine.base_currency must be a three-letter currency code, got '{}'",
            config.engine.base_currency
        )));
    }
    config.engine.base_currency = currency;

    if config.engine.price_padding_days < 0 {
        return Err(ConfigError::ValidationError(
            "engine.price_padding_days must not be negative".to_string(),
        ));
    }
    if !(config.solver.tolerance.is_finite() && config.solver.tolerance > 0.0) {
        return Err(ConfigError::ValidationError(
            "solver.tolerance must be a positive number".to_string(),
        ));
    }
    if config.solver.max_iterations == 0 {
        return Err(ConfigError::ValidationError(
            "solver.max_iterations must be at least 1".to_string(),
        ));
    }

    Ok(config)
}
