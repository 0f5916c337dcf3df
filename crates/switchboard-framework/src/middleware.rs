//! Middleware pipeline around rich command handlers.
//!
//! Every rich command is wrapped in a tower [`Service`] that calls its
//! [`Command::handle`]. Middleware are ordinary tower [`Layer`]s stacked on
//! top of that service. The stack is composed once per command during
//! [`MuxBuilder::initialize`](crate::MuxBuilder::initialize), so an event
//! only clones a ready-made service.
//!
//! Composition follows registration order: the first middleware registered
//! is the outermost one.
//!
//! ```text
//! use_middleware(a); use_middleware(b);
//!
//!   a.pre ─▶ b.pre ─▶ Command::handle ─▶ b.post ─▶ a.post
//! ```
//!
//! A middleware may short-circuit by not calling the inner service. It must
//! not swallow the inner service's error: observe it, log it, then return it.
//!
//! # Example
//!
//! ```rust,ignore
//! mux.use_middleware(Middleware::layer(TraceLayer));
//! mux.use_middleware(Middleware::from_fn(|ctx, next| async move {
//!     if ctx.author().bot {
//!         return Ok(());
//!     }
//!     next.run(ctx).await
//! }));
//! ```

use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Layer, Service, ServiceExt};
use tower_layer::layer_fn;
use tracing::{debug, info, warn};

use crate::command::BoxedCommand;
use crate::context::Context;

/// The type-erased service a composed pipeline is stored as.
pub type BoxedCommandService = BoxCloneSyncService<Arc<Context>, (), BoxError>;

// ============================================================================
// CommandService - the innermost service
// ============================================================================

/// A tower [`Service`] that invokes a command's handler.
#[derive(Clone)]
pub struct CommandService {
    command: BoxedCommand,
}

impl CommandService {
    pub fn new(command: BoxedCommand) -> Self {
        Self { command }
    }
}

impl Service<Arc<Context>> for CommandService {
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let command = Arc::clone(&self.command);
        Box::pin(async move { command.handle(&ctx).await })
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// A type-erased middleware: a function from the inner pipeline to the
/// wrapped pipeline.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(BoxedCommandService) -> BoxedCommandService + Send + Sync>);

impl Middleware {
    /// Wraps any tower [`Layer`] whose service speaks `Arc<Context>`.
    pub fn layer<L>(layer: L) -> Self
    where
        L: Layer<BoxedCommandService> + Send + Sync + 'static,
        L::Service:
            Service<Arc<Context>, Response = (), Error = BoxError> + Clone + Send + Sync + 'static,
        <L::Service as Service<Arc<Context>>>::Future: Send + 'static,
    {
        Self(Arc::new(move |inner: BoxedCommandService| -> BoxedCommandService {
            BoxCloneSyncService::new(layer.layer(inner))
        }))
    }

    /// Builds a middleware from an async function receiving the context and
    /// the rest of the pipeline.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Context>, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::layer(layer_fn(move |inner: BoxedCommandService| FnService {
            f: f.clone(),
            inner,
        }))
    }

    pub(crate) fn apply(&self, inner: BoxedCommandService) -> BoxedCommandService {
        (self.0)(inner)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// Composes `middleware` around `command`, first entry outermost.
pub fn compose(command: BoxedCommand, middleware: &[Middleware]) -> BoxedCommandService {
    middleware.iter().rev().fold(
        BoxCloneSyncService::new(CommandService::new(command)),
        |inner, m| m.apply(inner),
    )
}

// ============================================================================
// Function middleware
// ============================================================================

/// The remainder of the pipeline, handed to [`Middleware::from_fn`] closures.
pub struct Next {
    inner: BoxedCommandService,
}

impl Next {
    /// Runs the rest of the pipeline.
    pub async fn run(self, ctx: Arc<Context>) -> Result<(), BoxError> {
        self.inner.oneshot(ctx).await
    }
}

#[derive(Clone)]
struct FnService<F> {
    f: F,
    inner: BoxedCommandService,
}

impl<F, Fut> Service<Arc<Context>> for FnService<F>
where
    F: Fn(Arc<Context>, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let next = Next {
            inner: self.inner.clone(),
        };
        Box::pin((self.f)(ctx, next))
    }
}

// ============================================================================
// TraceLayer
// ============================================================================

/// Logs every invocation with its user, channel, outcome and duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

#[derive(Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S> Service<Arc<Context>> for TraceService<S>
where
    S: Service<Arc<Context>, Response = (), Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let started = Instant::now();
            debug!(
                command = ctx.command(),
                user = %ctx.author().id,
                args = ?ctx.args(),
                "Invoking command"
            );

            let result = inner.oneshot(Arc::clone(&ctx)).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => info!(
                    command = ctx.command(),
                    user = %ctx.author().id,
                    channel = ctx.channel_id(),
                    elapsed_ms,
                    "Command completed"
                ),
                Err(e) => warn!(
                    command = ctx.command(),
                    user = %ctx.author().id,
                    channel = ctx.channel_id(),
                    elapsed_ms,
                    error = %e,
                    "Command failed"
                ),
            }
            result
        })
    }
}
