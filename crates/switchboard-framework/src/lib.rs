//! # Switchboard Framework
//!
//! The command multiplexer: everything between "a chat message arrived" and
//! "a command handler ran".
//!
//! This layer provides:
//! - The [`Command`] trait and canned-reply [`SimpleCommand`]s
//! - A name-keyed [`Registry`] with typo-tolerant [`FuzzyMatcher`] lookup
//! - Role-based [`PermissionTable`]s and per-user [`RateLimiter`]s
//! - A tower-based [`Middleware`] pipeline around every rich command
//! - The [`Mux`] dispatcher and the built-in [`HelpCommand`]
//! - Clap-based typed arguments (with the `typed-args` feature)
//!
//! It is transport-agnostic: inbound events and outbound replies go through
//! the types of `switchboard-core`.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod fuzzy;
pub mod help;
pub mod middleware;
pub mod options;
pub mod parse;
pub mod permission;
pub mod ratelimit;
pub mod registry;

#[cfg(feature = "typed-args")]
mod args;

pub use command::{
    BoxedCommand, Command, CommandSettings, Descriptor, RateLimit, RichCommand, SimpleCommand,
};
pub use context::Context;
pub use dispatcher::{Mux, MuxBuilder, Outcome};
pub use error::{DispatchFailure, ErrorTexts, MuxError, MuxResult, Rejection};
pub use fuzzy::FuzzyMatcher;
pub use help::HelpCommand;
pub use middleware::{BoxedCommandService, Middleware, Next, TraceLayer};
pub use options::{DropReason, Options};
pub use permission::PermissionTable;
pub use ratelimit::{RateDecision, RateLimiter};
pub use registry::Registry;

pub use async_trait::async_trait;
pub use tower::BoxError;
