//! Configuration management for the booking bot
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (BOOKING_BOT__ prefix, `__` separator)
//! - Conventional service variables (`LuisAppId`, `QnAEndpointKey`, ...) as
//!   per-field defaults

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, AnalyticsConfig, DialogConfig, LuisConfig, ObservabilityConfig,
    PersistenceConfig, QnaConfig, RuntimeEnvironment, ServerConfig, Settings,
    TextAnalyticsConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
