//! The event loop.
//!
//! [`SwitchboardRuntime`] pulls events from an [`EventSource`] and hands each
//! one to the multiplexer on its own tokio task, so a slow or failing
//! invocation never holds up the next event. Alongside the loop a sweeper
//! task periodically evicts expired rate-limit entries.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().load()?;
//! let mut builder = config.mux_builder()?;
//! builder.register(HelpCommand::default())?;
//! let mux = builder.initialize().await?;
//!
//! let runtime = SwitchboardRuntime::from_config(&config, mux, transport);
//! runtime.run(source).await?;
//! ```
//!
//! Shutdown (Ctrl+C, SIGTERM, a caller-supplied future or
//! [`SwitchboardRuntime::shutdown_token`]) stops intake; invocations already
//! running are awaited before `run` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use switchboard_core::{BoxedTransport, ChatEvent, TimeoutTransport, TransportError, TransportResult};
use switchboard_framework::{Mux, Outcome};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SwitchboardConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// EventSource
// =============================================================================

/// The inbound half of a platform session.
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Waits for the next event.
    ///
    /// `Ok(None)` and [`TransportError::Closed`] end the loop gracefully; any
    /// other error aborts it. The returned future must be cancel safe.
    async fn next_event(&mut self) -> TransportResult<Option<ChatEvent>>;
}

#[async_trait]
impl EventSource for mpsc::Receiver<ChatEvent> {
    async fn next_event(&mut self) -> TransportResult<Option<ChatEvent>> {
        Ok(self.recv().await)
    }
}

#[async_trait]
impl EventSource for mpsc::UnboundedReceiver<ChatEvent> {
    async fn next_event(&mut self) -> TransportResult<Option<ChatEvent>> {
        Ok(self.recv().await)
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Counters of handled events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub received: u64,
    pub completed: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Dropped by the eligibility filter or not addressed to the bot.
    pub ignored: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    completed: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
}

impl Counters {
    fn record(&self, joined: Result<Outcome, JoinError>) {
        let counter = match joined {
            Ok(Outcome::Completed { .. }) => &self.completed,
            Ok(Outcome::Rejected(_)) => &self.rejected,
            Ok(Outcome::Failed { .. }) => &self.failed,
            Ok(Outcome::Dropped(_) | Outcome::NotCommand) => &self.ignored,
            Err(e) => {
                error!(error = %e, "Dispatch task did not complete");
                &self.failed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RuntimeStats {
        RuntimeStats {
            received: self.received.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// SwitchboardRuntime
// =============================================================================

/// Drives a [`Mux`] from an [`EventSource`].
pub struct SwitchboardRuntime {
    mux: Mux,
    transport: BoxedTransport,
    sweep_interval: Option<Duration>,
    shutdown: CancellationToken,
    counters: Arc<Counters>,
}

impl SwitchboardRuntime {
    /// Creates a runtime with the default sweep interval and no per-call
    /// transport deadline.
    pub fn new(mux: Mux, transport: BoxedTransport) -> Self {
        Self {
            mux,
            transport,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
            shutdown: CancellationToken::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Creates a runtime from configuration.
    ///
    /// Initializes logging, bounds every transport call with
    /// `bot.reply_timeout_ms` and applies the sweep interval.
    pub fn from_config(config: &SwitchboardConfig, mux: Mux, transport: BoxedTransport) -> Self {
        logging::init_from_config(&config.logging);

        let timeout = config.bot.reply_timeout();
        let transport: BoxedTransport = Arc::new(TimeoutTransport::new(transport, timeout));

        info!(
            prefix = mux.prefix(),
            commands = mux.command_names().len(),
            reply_timeout = ?timeout,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self::new(mux, transport).with_sweep_interval(config.sweep_interval())
    }

    /// Sets the rate-limit sweep interval; `None` disables the sweeper.
    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn mux(&self) -> &Mux {
        &self.mux
    }

    /// A token that stops the loop when cancelled.
    ///
    /// Cancelling it is permanent: later runs return immediately.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.counters.snapshot()
    }

    /// Runs until the source ends or Ctrl+C / SIGTERM is received.
    pub async fn run<S: EventSource>(&self, source: S) -> RuntimeResult<RuntimeStats> {
        let signal = shutdown_signal()?;
        info!("Switchboard is running. Press Ctrl+C to stop.");
        self.run_until(source, signal).await
    }

    /// Runs until the source ends or `shutdown` completes.
    pub async fn run_until<S, F>(&self, mut source: S, shutdown: F) -> RuntimeResult<RuntimeStats>
    where
        S: EventSource,
        F: Future<Output = ()> + Send,
    {
        // Per-run token; cancelling the runtime token still stops this run.
        let run_token = self.shutdown.child_token();
        let sweeper = self
            .sweep_interval
            .map(|every| spawn_sweeper(self.mux.clone(), every, run_token.child_token()));

        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        let result = loop {
            tokio::select! {
                _ = run_token.cancelled() => break Ok(()),
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.counters.record(joined);
                }
                next = source.next_event() => match next {
                    Ok(Some(event)) => {
                        self.counters.received.fetch_add(1, Ordering::Relaxed);
                        let mux = self.mux.clone();
                        let transport = Arc::clone(&self.transport);
                        tasks.spawn(async move { mux.handle(event, transport).await });
                    }
                    Ok(None) | Err(TransportError::Closed) => {
                        info!("Event source closed");
                        break Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "Event source failed");
                        break Err(RuntimeError::Source(e));
                    }
                },
            }
        };

        run_token.cancel();

        if !tasks.is_empty() {
            debug!(in_flight = tasks.len(), "Waiting for in-flight invocations");
        }
        while let Some(joined) = tasks.join_next().await {
            self.counters.record(joined);
        }
        if let Some(sweeper) = sweeper
            && let Err(e) = sweeper.await
        {
            warn!(error = %e, "Rate-limit sweeper ended abnormally");
        }

        let stats = self.stats();
        info!(
            received = stats.received,
            completed = stats.completed,
            rejected = stats.rejected,
            failed = stats.failed,
            "Switchboard stopped"
        );
        result.map(|()| stats)
    }
}

/// Periodically evicts expired rate-limit entries until `token` is cancelled.
fn spawn_sweeper(mux: Mux, every: Duration, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = mux.rate_limiter().sweep();
                    if evicted > 0 {
                        debug!(evicted, "Swept expired rate-limit entries");
                    }
                }
            }
        }
    })
}

/// Resolves on Ctrl+C or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            },
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    Ok(async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use switchboard_core::{Author, Embed, Transport};
    use switchboard_framework::{
        BoxError, Command, CommandSettings, Context, MuxBuilder, RateLimit,
    };

    use super::*;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Outbox {
        async fn send_text(&self, _channel_id: &str, content: &str) -> TransportResult<String> {
            self.sent.lock().push(content.to_string());
            Ok("id".into())
        }

        async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
            self.send_text(channel_id, &embed.to_plain_text()).await
        }
    }

    struct Ping;

    #[async_trait]
    impl Command for Ping {
        fn settings(&self) -> CommandSettings {
            CommandSettings::new("ping", "Pong")
        }

        async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
            ctx.reply("pong").await?;
            Ok(())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        async fn next_event(&mut self) -> TransportResult<Option<ChatEvent>> {
            Err(TransportError::Other("connection reset".into()))
        }
    }

    fn event(content: &str) -> ChatEvent {
        ChatEvent::new("m", "general", content).guild("g").author(Author {
            id: "u1".into(),
            ..Default::default()
        })
    }

    async fn ping_mux() -> Mux {
        let mut builder = MuxBuilder::new("!").unwrap();
        builder.register(Ping).unwrap();
        builder.initialize().await.unwrap()
    }

    #[tokio::test]
    async fn test_run_until_source_closes() {
        let outbox = Arc::new(Outbox::default());
        let runtime = SwitchboardRuntime::new(ping_mux().await, outbox.clone());

        let (tx, rx) = mpsc::channel(8);
        for content in ["!ping", "hello", "!nope", "!ping"] {
            tx.send(event(content)).await.unwrap();
        }
        drop(tx);

        let stats = runtime
            .run_until(rx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(
            stats,
            RuntimeStats {
                received: 4,
                completed: 2,
                rejected: 1,
                failed: 0,
                ignored: 1,
            }
        );
        let mut sent = outbox.sent.lock().clone();
        sent.sort();
        assert_eq!(sent, vec!["Command not found.", "pong", "pong"]);
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_loop() {
        let runtime = SwitchboardRuntime::new(ping_mux().await, Arc::new(Outbox::default()));
        let (_tx, rx) = mpsc::channel::<ChatEvent>(1);

        runtime.shutdown_token().cancel();
        let stats = runtime
            .run_until(rx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, RuntimeStats::default());
    }

    #[tokio::test]
    async fn test_runtime_can_run_again_after_source_closes() {
        let outbox = Arc::new(Outbox::default());
        let runtime = SwitchboardRuntime::new(ping_mux().await, outbox.clone());

        for _ in 0..2 {
            let (tx, rx) = mpsc::channel(1);
            tx.send(event("!ping")).await.unwrap();
            drop(tx);
            runtime
                .run_until(rx, std::future::pending())
                .await
                .unwrap();
        }

        assert_eq!(runtime.stats().completed, 2);
        assert_eq!(*outbox.sent.lock(), vec!["pong", "pong"]);
        assert!(!runtime.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_future_stops_loop() {
        let runtime = SwitchboardRuntime::new(ping_mux().await, Arc::new(Outbox::default()));
        let (_tx, rx) = mpsc::channel::<ChatEvent>(1);

        let result = runtime.run_until(rx, async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_source_error_aborts() {
        let runtime = SwitchboardRuntime::new(ping_mux().await, Arc::new(Outbox::default()));

        let err = runtime
            .run_until(FailingSource, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Source(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_expired_entries() {
        let mux = ping_mux().await;
        let limit = RateLimit {
            max: 1,
            window: Duration::from_secs(30),
        };
        mux.rate_limiter().check("ping", "u1", limit);
        assert_eq!(mux.rate_limiter().len(), 1);

        let token = CancellationToken::new();
        let sweeper = spawn_sweeper(mux.clone(), Duration::from_secs(60), token.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(mux.rate_limiter().is_empty());

        token.cancel();
        sweeper.await.unwrap();
    }
}
