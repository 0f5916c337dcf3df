//! Error types for the Switchboard framework.

use serde::{Deserialize, Serialize};
use switchboard_core::TransportError;
use thiserror::Error;
use tower::BoxError;

/// Failures that abort startup. None of these can occur once
/// [`MuxBuilder::initialize`](crate::MuxBuilder::initialize) has returned.
#[derive(Debug, Error)]
pub enum MuxError {
    /// Two descriptors (rich or simple) share a name.
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    /// A command was registered with an empty or whitespace-containing name.
    #[error("invalid command name '{0}'")]
    InvalidCommandName(String),

    /// The configured prefix is empty or contains whitespace.
    #[error("invalid command prefix '{0}'")]
    InvalidPrefix(String),

    /// A command's `init` hook failed.
    #[error("failed to initialize command '{command}': {source}")]
    InitFailed {
        command: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for startup operations.
pub type MuxResult<T> = Result<T, MuxError>;

/// User-facing dispatch failures. Each one is answered with the matching
/// [`ErrorTexts`] string and ends dispatch cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    CommandNotFound,
    NoPermissions,
    RateLimited,
}

/// Failures of a dispatched invocation. They are logged and isolated to the
/// invocation that produced them.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// The handler (or a middleware) returned an error.
    #[error("handler failed: {0}")]
    Handler(BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Sending a reply failed.
    #[error("failed to send reply: {0}")]
    Reply(#[from] TransportError),
}

/// Messages sent to the user for each [`Rejection`].
///
/// An empty string silences the corresponding reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorTexts {
    pub command_not_found: String,
    pub no_permissions: String,
    pub rate_limited: String,
}

impl Default for ErrorTexts {
    fn default() -> Self {
        Self {
            command_not_found: "Command not found.".to_string(),
            no_permissions: "You do not have permissions to execute that command.".to_string(),
            rate_limited: "You've used this command too many times, wait a bit and try again."
                .to_string(),
        }
    }
}

impl ErrorTexts {
    /// Returns the text for `rejection`.
    pub fn text(&self, rejection: Rejection) -> &str {
        match rejection {
            Rejection::CommandNotFound => &self.command_not_found,
            Rejection::NoPermissions => &self.no_permissions,
            Rejection::RateLimited => &self.rate_limited,
        }
    }
}
