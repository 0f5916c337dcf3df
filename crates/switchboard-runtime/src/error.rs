//! Runtime error types.

use switchboard_core::TransportError;
use switchboard_framework::MuxError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort startup or the event loop.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The multiplexer failed to build or initialize.
    #[error("Multiplexer error: {0}")]
    Mux(#[from] MuxError),

    /// The event source failed irrecoverably.
    #[error("Event source error: {0}")]
    Source(#[from] TransportError),

    /// Installing a shutdown signal handler failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
