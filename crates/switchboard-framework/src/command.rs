//! Command descriptors.
//!
//! Two kinds of command share one namespace:
//!
//! - **Rich commands** implement the [`Command`] trait and run code for every
//!   invocation.
//! - **Simple commands** ([`SimpleCommand`]) answer with a fixed piece of
//!   text and run no code at all.
//!
//! Both are stored in the registry as a [`Descriptor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use switchboard_framework::{BoxError, Command, CommandSettings, Context};
//!
//! struct Inspire;
//!
//! #[async_trait::async_trait]
//! impl Command for Inspire {
//!     fn settings(&self) -> CommandSettings {
//!         CommandSettings::new("inspire", "Get an inspirational quote")
//!             .rate_limit(3, Duration::from_secs(300))
//!     }
//!
//!     async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
//!         ctx.reply("Believe in yourself.").await?;
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tower::BoxError;

use crate::context::Context;
use crate::dispatcher::Mux;

// ============================================================================
// Settings
// ============================================================================

/// A fixed-window invocation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Invocations allowed per user inside one window.
    pub max: u32,
    /// Length of the window.
    pub window: Duration,
}

/// Static settings a command declares once, at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    /// Unique, case-sensitive command name (without prefix).
    pub name: String,
    /// One-line description shown in help listings.
    pub help_text: String,
    /// Per-user rate limit; `None` means unlimited.
    pub rate_limit: Option<RateLimit>,
}

impl CommandSettings {
    pub fn new(name: impl Into<String>, help_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help_text: help_text.into(),
            rate_limit: None,
        }
    }

    /// Limits each user to `max` invocations per `window`.
    ///
    /// A `max` of zero leaves the command unlimited.
    pub fn rate_limit(mut self, max: u32, window: Duration) -> Self {
        self.rate_limit = (max > 0).then_some(RateLimit { max, window });
        self
    }
}

// ============================================================================
// Command trait
// ============================================================================

/// The capability set every rich command provides.
///
/// Only [`settings`](Command::settings) and [`handle`](Command::handle) are
/// required.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Returns the command's settings. Called exactly once, at registration.
    fn settings(&self) -> CommandSettings;

    /// One-time setup, called in registration order by
    /// [`MuxBuilder::initialize`](crate::MuxBuilder::initialize).
    ///
    /// The multiplexer is fully assembled at this point, so a command may
    /// query it (for example [`Mux::command_names`]). Returning an error
    /// aborts startup.
    async fn init(&self, _mux: &Mux) -> Result<(), BoxError> {
        Ok(())
    }

    /// Handles one invocation.
    ///
    /// Errors are logged by the multiplexer together with the invoking user
    /// and command; reporting a friendly message to the user is the
    /// handler's own job.
    async fn handle(&self, ctx: &Context) -> Result<(), BoxError>;

    /// Produces custom output for `help <command>`.
    ///
    /// Return `false` to fall back to the static help text.
    async fn handle_help(&self, _ctx: &Context) -> bool {
        false
    }
}

/// A shared [`Command`] trait object.
pub type BoxedCommand = Arc<dyn Command>;

// ============================================================================
// SimpleCommand
// ============================================================================

/// A canned reply registered under a command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub name: String,
    /// The text sent back verbatim.
    pub content: String,
    pub help_text: String,
}

impl SimpleCommand {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        help_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            help_text: help_text.into(),
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// A rich command together with the settings it declared at registration.
#[derive(Clone)]
pub struct RichCommand {
    settings: CommandSettings,
    command: BoxedCommand,
}

impl RichCommand {
    pub(crate) fn new(command: BoxedCommand) -> Self {
        Self {
            settings: command.settings(),
            command,
        }
    }

    pub fn settings(&self) -> &CommandSettings {
        &self.settings
    }

    pub fn command(&self) -> &BoxedCommand {
        &self.command
    }
}

impl fmt::Debug for RichCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichCommand")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// A registered command of either kind.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Rich(RichCommand),
    Simple(SimpleCommand),
}

impl Descriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Rich(rich) => &rich.settings.name,
            Self::Simple(simple) => &simple.name,
        }
    }

    pub fn help_text(&self) -> &str {
        match self {
            Self::Rich(rich) => &rich.settings.help_text,
            Self::Simple(simple) => &simple.help_text,
        }
    }

    /// Simple commands are never rate limited.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        match self {
            Self::Rich(rich) => rich.settings.rate_limit,
            Self::Simple(_) => None,
        }
    }

    pub fn as_rich(&self) -> Option<&RichCommand> {
        match self {
            Self::Rich(rich) => Some(rich),
            Self::Simple(_) => None,
        }
    }
}

impl From<SimpleCommand> for Descriptor {
    fn from(simple: SimpleCommand) -> Self {
        Self::Simple(simple)
    }
}
