//! The command multiplexer.
//!
//! [`MuxBuilder`] collects commands, middleware and policy at startup;
//! [`MuxBuilder::initialize`] freezes them into a [`Mux`], runs every
//! command's `init` hook and composes each command's middleware pipeline.
//!
//! # Dispatch
//!
//! For every inbound event [`Mux::handle`] runs the following stages,
//! stopping at the first one that fails:
//!
//! 1. **Filter**: drop events the [`Options`] exclude (silent).
//! 2. **Parse**: require the prefix and split the body into name and
//!    arguments (silent when the prefix is absent).
//! 3. **Resolve**: exact lookup, then fuzzy lookup when enabled
//!    ([`Rejection::CommandNotFound`]).
//! 4. **Authorize**: consult the [`PermissionTable`] ([`Rejection::NoPermissions`]).
//! 5. **Rate limit**: consult the [`RateLimiter`] ([`Rejection::RateLimited`]).
//! 6. **Dispatch**: send a simple command's text, or run a rich command's
//!    pipeline.
//!
//! Rejections are answered with the configured [`ErrorTexts`]. Handler
//! errors and panics are caught at this boundary and logged; they never
//! reach the caller or other invocations.
//!
//! ```rust,ignore
//! let mut mux = MuxBuilder::new("!")?;
//! mux.use_middleware(Middleware::layer(TraceLayer));
//! mux.set_permissions(config.permissions());
//! mux.register(Wiki::new())?;
//! mux.register(HelpCommand::new("help", "Displays help information"))?;
//! mux.register_simple(SimpleCommand::new("rules", "Be nice.", "Server rules"))?;
//! mux.use_fuzzy();
//!
//! let mux = mux.initialize().await?;
//! let outcome = mux.handle(event, transport).await;
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use switchboard_core::{BoxedTransport, ChatEvent};
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::command::{Command, Descriptor, RichCommand, SimpleCommand};
use crate::context::Context;
use crate::error::{DispatchFailure, ErrorTexts, MuxError, MuxResult, Rejection};
use crate::fuzzy::FuzzyMatcher;
use crate::middleware::{BoxedCommandService, Middleware, compose};
use crate::options::{DropReason, Options};
use crate::parse::parse;
use crate::permission::PermissionTable;
use crate::ratelimit::{RateDecision, RateLimiter};
use crate::registry::Registry;

// ============================================================================
// Outcome
// ============================================================================

/// How the dispatch of one event ended.
#[derive(Debug)]
pub enum Outcome {
    /// Excluded by the eligibility filter; nothing was sent.
    Dropped(DropReason),
    /// Not addressed to the bot; nothing was sent.
    NotCommand,
    /// Rejected with a user-facing error message.
    Rejected(Rejection),
    /// The command ran to completion.
    Completed {
        /// The resolved command name.
        command: String,
    },
    /// The command was dispatched but failed.
    Failed {
        command: String,
        failure: DispatchFailure,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

// ============================================================================
// MuxBuilder
// ============================================================================

/// Startup-time configuration of a [`Mux`].
///
/// All registration happens here; once [`initialize`](Self::initialize)
/// returns, the command set and policy are immutable.
#[derive(Debug)]
pub struct MuxBuilder {
    prefix: String,
    registry: Registry,
    middleware: Vec<Middleware>,
    permissions: PermissionTable,
    errors: ErrorTexts,
    options: Options,
    fuzzy: Option<FuzzyMatcher>,
    rate_limiter: RateLimiter,
}

impl MuxBuilder {
    /// Creates a builder for commands starting with `prefix`.
    ///
    /// The prefix must be non-empty and free of whitespace.
    pub fn new(prefix: impl Into<String>) -> MuxResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(MuxError::InvalidPrefix(prefix));
        }

        Ok(Self {
            prefix,
            registry: Registry::new(),
            middleware: Vec::new(),
            permissions: PermissionTable::new(),
            errors: ErrorTexts::default(),
            options: Options::default(),
            fuzzy: None,
            rate_limiter: RateLimiter::new(),
        })
    }

    /// Registers a rich command.
    pub fn register<C: Command>(&mut self, command: C) -> MuxResult<&mut Self> {
        self.register_arc(Arc::new(command))
    }

    /// Registers a rich command that is already shared.
    pub fn register_arc(&mut self, command: Arc<dyn Command>) -> MuxResult<&mut Self> {
        self.registry
            .register(Descriptor::Rich(RichCommand::new(command)))?;
        Ok(self)
    }

    /// Registers a canned-reply command.
    pub fn register_simple(&mut self, command: SimpleCommand) -> MuxResult<&mut Self> {
        self.registry.register(Descriptor::Simple(command))?;
        Ok(self)
    }

    /// Appends a middleware; the first one added is the outermost.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn set_permissions(&mut self, permissions: PermissionTable) -> &mut Self {
        self.permissions = permissions;
        self
    }

    pub fn set_errors(&mut self, errors: ErrorTexts) -> &mut Self {
        self.errors = errors;
        self
    }

    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    /// Enables fuzzy resolution with the default threshold.
    pub fn use_fuzzy(&mut self) -> &mut Self {
        self.use_fuzzy_matcher(FuzzyMatcher::default())
    }

    /// Enables fuzzy resolution with a custom matcher.
    pub fn use_fuzzy_matcher(&mut self, matcher: FuzzyMatcher) -> &mut Self {
        self.fuzzy = Some(matcher);
        self
    }

    /// Replaces the rate limiter (for example to tune the shard count).
    pub fn set_rate_limiter(&mut self, rate_limiter: RateLimiter) -> &mut Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Freezes the configuration, composes each command's pipeline and runs
    /// every command's `init` hook in registration order.
    ///
    /// The first failing hook aborts startup with [`MuxError::InitFailed`].
    pub async fn initialize(self) -> MuxResult<Mux> {
        let pipelines: HashMap<String, BoxedCommandService> = self
            .registry
            .iter()
            .filter_map(Descriptor::as_rich)
            .map(|rich| {
                (
                    rich.settings().name.clone(),
                    compose(Arc::clone(rich.command()), &self.middleware),
                )
            })
            .collect();

        let mux = Mux {
            inner: Arc::new(MuxInner {
                prefix: self.prefix,
                registry: self.registry,
                pipelines,
                permissions: self.permissions,
                errors: self.errors,
                options: self.options,
                fuzzy: self.fuzzy,
                rate_limiter: self.rate_limiter,
            }),
        };

        for rich in mux.inner.registry.iter().filter_map(Descriptor::as_rich) {
            let name = &rich.settings().name;
            rich.command()
                .init(&mux)
                .await
                .map_err(|source| MuxError::InitFailed {
                    command: name.clone(),
                    source,
                })?;
            debug!(command = %name, "Initialized command");
        }

        info!(
            prefix = %mux.inner.prefix,
            commands = mux.inner.registry.len(),
            middleware = self.middleware.len(),
            fuzzy = mux.inner.fuzzy.is_some(),
            "Multiplexer initialized"
        );

        Ok(mux)
    }
}

// ============================================================================
// Mux
// ============================================================================

struct MuxInner {
    prefix: String,
    registry: Registry,
    pipelines: HashMap<String, BoxedCommandService>,
    permissions: PermissionTable,
    errors: ErrorTexts,
    options: Options,
    fuzzy: Option<FuzzyMatcher>,
    rate_limiter: RateLimiter,
}

/// An initialized command multiplexer.
///
/// `Mux` is a cheap, clonable handle. Everything but the rate limiter is
/// immutable, so [`handle`](Self::handle) can run concurrently from any
/// number of tasks.
#[derive(Clone)]
pub struct Mux {
    inner: Arc<MuxInner>,
}

impl Mux {
    /// The command prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// All registered command names, in registration order.
    pub fn command_names(&self) -> Vec<&str> {
        self.inner.registry.all_names()
    }

    /// Looks up a command by exact name.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        self.inner.registry.lookup(name)
    }

    /// Iterates over registered commands in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.inner.registry.iter()
    }

    pub fn errors(&self) -> &ErrorTexts {
        &self.inner.errors
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn permissions(&self) -> &PermissionTable {
        &self.inner.permissions
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Resolves a typed name to a descriptor, falling back to fuzzy matching
    /// when it is enabled.
    pub fn resolve(&self, name: &str) -> Option<&Descriptor> {
        if let Some(descriptor) = self.inner.registry.lookup(name) {
            return Some(descriptor);
        }

        let matcher = self.inner.fuzzy.as_ref()?;
        let suggestion = matcher.best_match(name, self.inner.registry.all_names())?;
        debug!(typed = name, resolved = suggestion, "Fuzzy-matched command");
        self.inner.registry.lookup(suggestion)
    }

    /// Handles one inbound event to completion.
    ///
    /// Safe to call concurrently. Never panics because of a handler.
    pub async fn handle(&self, event: ChatEvent, transport: BoxedTransport) -> Outcome {
        let span = info_span!(
            "dispatch",
            message_id = %event.message_id,
            channel = %event.channel_id,
            user = %event.author.id,
        );
        self.dispatch(event, transport).instrument(span).await
    }

    /// Spawns [`handle`](Self::handle) on its own tokio task.
    pub fn spawn_handle(&self, event: ChatEvent, transport: BoxedTransport) -> JoinHandle<Outcome> {
        let mux = self.clone();
        tokio::spawn(async move { mux.handle(event, transport).await })
    }

    async fn dispatch(&self, event: ChatEvent, transport: BoxedTransport) -> Outcome {
        if let Some(reason) = self.inner.options.filter(&event) {
            debug!(?reason, "Dropped ineligible event");
            return Outcome::Dropped(reason);
        }

        let Some(invocation) = parse(&self.inner.prefix, &event.content) else {
            return Outcome::NotCommand;
        };

        let Some(descriptor) = self.resolve(invocation.name) else {
            debug!(command = invocation.name, "Command not found");
            return self
                .reject(Rejection::CommandNotFound, &event, &transport)
                .await;
        };

        let name = descriptor.name();
        if !self
            .inner
            .permissions
            .allows(event.author.roles.as_slice(), name)
        {
            info!(command = name, "Permission denied");
            return self.reject(Rejection::NoPermissions, &event, &transport).await;
        }

        if let Some(limit) = descriptor.rate_limit() {
            let decision = self.inner.rate_limiter.check(name, &event.author.id, limit);
            if let RateDecision::Limited { retry_after } = decision {
                info!(command = name, ?retry_after, "Rate limited");
                return self.reject(Rejection::RateLimited, &event, &transport).await;
            }
        }

        match descriptor {
            Descriptor::Simple(simple) => {
                match transport.send_text(&event.channel_id, &simple.content).await {
                    Ok(_) => Outcome::Completed {
                        command: simple.name.clone(),
                    },
                    Err(e) => {
                        warn!(command = %simple.name, error = %e, "Failed to send simple reply");
                        Outcome::Failed {
                            command: simple.name.clone(),
                            failure: DispatchFailure::Reply(e),
                        }
                    }
                }
            }
            Descriptor::Rich(rich) => {
                let args = invocation.args.iter().map(|a| a.to_string()).collect();
                let invoked_as = invocation.name.to_string();
                self.run_pipeline(rich, event, invoked_as, args, transport)
                    .await
            }
        }
    }

    async fn run_pipeline(
        &self,
        rich: &RichCommand,
        event: ChatEvent,
        invoked_as: String,
        args: Vec<String>,
        transport: BoxedTransport,
    ) -> Outcome {
        let command = rich.settings().name.clone();
        let Some(pipeline) = self.inner.pipelines.get(&command).cloned() else {
            error!(command = %command, "No pipeline composed for command");
            return Outcome::Failed {
                command,
                failure: DispatchFailure::Handler("missing pipeline".into()),
            };
        };

        let user = event.author.id.clone();
        let ctx = Arc::new(Context::new(
            event,
            invoked_as,
            args,
            Descriptor::Rich(rich.clone()),
            transport,
            self.clone(),
        ));

        let result = AssertUnwindSafe(pipeline.oneshot(ctx)).catch_unwind().await;

        match result {
            Ok(Ok(())) => Outcome::Completed { command },
            Ok(Err(e)) => {
                error!(command = %command, user = %user, error = %e, "Command handler failed");
                Outcome::Failed {
                    command,
                    failure: DispatchFailure::Handler(e),
                }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(command = %command, user = %user, panic = %message, "Command handler panicked");
                Outcome::Failed {
                    command,
                    failure: DispatchFailure::Panicked(message),
                }
            }
        }
    }

    async fn reject(
        &self,
        rejection: Rejection,
        event: &ChatEvent,
        transport: &BoxedTransport,
    ) -> Outcome {
        let text = self.inner.errors.text(rejection);
        if text.is_empty() {
            return Outcome::Rejected(rejection);
        }
        if let Err(e) = transport.send_text(&event.channel_id, text).await {
            warn!(?rejection, error = %e, "Failed to send rejection reply");
        }
        Outcome::Rejected(rejection)
    }
}

impl std::fmt::Debug for Mux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mux")
            .field("prefix", &self.inner.prefix)
            .field("commands", &self.inner.registry.all_names())
            .field("fuzzy", &self.inner.fuzzy)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
