//! Switchboard Runtime - the glue around the multiplexer.
//!
//! This crate provides:
//! - Layered configuration loading with figment ([`ConfigLoader`])
//! - Logging setup with `tracing-subscriber` ([`LoggingBuilder`])
//! - The event loop ([`SwitchboardRuntime`]) with task-per-event dispatch,
//!   a rate-limit sweeper and signal-driven shutdown
//! - Error-channel reporting middleware ([`ErrorReportLayer`])
//!
//! ```ignore
//! use switchboard_runtime::{ConfigLoader, ErrorReportLayer, SwitchboardRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!
//!     let mut builder = config.mux_builder()?;
//!     if let Some(channel) = &config.bot.error_channel {
//!         builder.use_middleware(ErrorReportLayer::new(channel).into_middleware());
//!     }
//!     builder.register(HelpCommand::default())?;
//!     let mux = builder.initialize().await?;
//!
//!     SwitchboardRuntime::from_config(&config, mux, transport)
//!         .run(source)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, SwitchboardConfig, validate_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use report::ErrorReportLayer;
pub use runtime::{EventSource, RuntimeStats, SwitchboardRuntime};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for command implementations.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
