//! Error types for transport operations.

use std::time::Duration;

use thiserror::Error;

/// Errors a [`Transport`](crate::Transport) call can produce.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The call did not complete within its deadline.
    #[error("transport call timed out after {0:?}")]
    Timeout(Duration),

    /// The platform rejected or failed to deliver the message.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The target channel does not exist or is not visible to the bot.
    #[error("channel '{0}' not found")]
    ChannelNotFound(String),

    /// The underlying session has been closed.
    #[error("transport closed")]
    Closed,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::SendFailed(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
