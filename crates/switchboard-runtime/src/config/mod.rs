//! Configuration for a switchboard deployment.
//!
//! Settings are loaded with figment from layered sources (defaults, files,
//! `SWITCHBOARD_*` environment variables) and validated before the
//! multiplexer is built from them.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SimpleCommandConfig,
    SpanEventConfig, SwitchboardConfig,
};
pub use validation::validate_config;
