//! Forwarding of handler failures to an operator channel.
//!
//! [`ErrorReportLayer`] sits in the command pipeline like any other
//! middleware. When the inner service fails it posts a short report to the
//! configured channel and then returns the error unchanged, so the
//! dispatcher still logs it.

use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::future::BoxFuture;
use switchboard_core::Embed;
use switchboard_framework::{BoxError, Context, Middleware};
use tower::{Layer, Service, ServiceExt};
use tracing::warn;

/// Color of report embeds.
const REPORT_COLOR: u32 = 0xE0_3E_3E;

/// Reports handler failures to `channel`.
#[derive(Debug, Clone)]
pub struct ErrorReportLayer {
    channel: Arc<str>,
}

impl ErrorReportLayer {
    pub fn new(channel: impl AsRef<str>) -> Self {
        Self {
            channel: Arc::from(channel.as_ref()),
        }
    }

    /// The layer as a multiplexer middleware.
    pub fn into_middleware(self) -> Middleware {
        Middleware::layer(self)
    }
}

impl<S> Layer<S> for ErrorReportLayer {
    type Service = ErrorReportService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorReportService {
            inner,
            channel: Arc::clone(&self.channel),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorReportService<S> {
    inner: S,
    channel: Arc<str>,
}

fn report(ctx: &Context, error: &BoxError) -> Embed {
    Embed::new()
        .title(format!("Command `{}` failed", ctx.command()))
        .description(error.to_string())
        .color(REPORT_COLOR)
        .inline_field("User", format!("{} ({})", ctx.author().name, ctx.author().id))
        .inline_field("Channel", ctx.channel_id())
        .field("Message", ctx.event().content.as_str())
}

impl<S> Service<Arc<Context>> for ErrorReportService<S>
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
        let channel = Arc::clone(&self.channel);

        Box::pin(async move {
            let result = inner.oneshot(Arc::clone(&ctx)).await;

            if let Err(e) = &result {
                let embed = report(&ctx, e);
                if let Err(send_err) = ctx.transport().send_embed(&channel, &embed).await {
                    warn!(
                        channel = %channel,
                        error = %send_err,
                        "Failed to deliver error report"
                    );
                }
            }
            result
        })
    }
}
