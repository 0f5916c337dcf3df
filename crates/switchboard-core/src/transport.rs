//! The outbound reply primitive.
//!
//! [`Transport`] is implemented by the platform session. The multiplexer and
//! the command handlers only ever talk to the platform through it, which
//! keeps them testable with an in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::embed::Embed;
use crate::error::{TransportError, TransportResult};

/// Operations a chat platform session exposes to command handlers.
///
/// Every method addresses a channel by identifier. Implementations should
/// bound each call with a deadline; wrap an implementation in
/// [`TimeoutTransport`] if it does not do so itself.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a plain text message, returning the new message identifier.
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String>;

    /// Sends a rich reply, returning the new message identifier.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String>;

    /// Shows a typing indicator in the channel.
    ///
    /// The default implementation does nothing.
    async fn typing(&self, _channel_id: &str) -> TransportResult<()> {
        Ok(())
    }
}

/// A shared [`Transport`] trait object.
pub type BoxedTransport = Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        (**self).send_text(channel_id, content).await
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        (**self).send_embed(channel_id, embed).await
    }

    async fn typing(&self, channel_id: &str) -> TransportResult<()> {
        (**self).typing(channel_id).await
    }
}

// ============================================================================
// TimeoutTransport
// ============================================================================

/// Wraps a transport so every call carries its own deadline.
///
/// A call that exceeds the deadline fails with [`TransportError::Timeout`];
/// only that call is affected.
///
/// # Example
///
/// ```rust,ignore
/// let transport: BoxedTransport =
///     Arc::new(TimeoutTransport::new(session, Duration::from_secs(10)));
/// ```
pub struct TimeoutTransport<T> {
    inner: T,
    timeout: Duration,
}

impl<T: Transport> TimeoutTransport<T> {
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<F, R>(&self, op: &'static str, fut: F) -> TransportResult<R>
    where
        F: Future<Output = TransportResult<R>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout = ?self.timeout, "Transport call timed out");
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for TimeoutTransport<T> {
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        self.bounded("send_text", self.inner.send_text(channel_id, content))
            .await
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        self.bounded("send_embed", self.inner.send_embed(channel_id, embed))
            .await
    }

    async fn typing(&self, channel_id: &str) -> TransportResult<()> {
        self.bounded("typing", self.inner.typing(channel_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send_text(&self, _channel_id: &str, content: &str) -> TransportResult<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(content.to_string())
        }

        async fn send_embed(&self, _channel_id: &str, _embed: &Embed) -> TransportResult<String> {
            Ok("embed".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let transport = TimeoutTransport::new(SlowTransport, Duration::from_secs(5));
        let result = transport.send_text("c", "hello").await;
        assert!(matches!(result, Err(TransportError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let transport = TimeoutTransport::new(SlowTransport, Duration::from_secs(5));
        let id = transport.send_embed("c", &Embed::new()).await.unwrap();
        assert_eq!(id, "embed");
        transport.typing("c").await.unwrap();
    }
}
