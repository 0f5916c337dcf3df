//! # Switchboard
//!
//! A concurrent, middleware-driven command multiplexer for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────────────────────┐
//! │ EventSource │────▶│ Runtime: one task per event                  │
//! └─────────────┘     └──────────────────────┬───────────────────────┘
//!                                            ▼
//!   ┌──────────────────────────── Mux ─────────────────────────────────┐
//!   │ filter ─▶ parse ─▶ resolve (exact/fuzzy) ─▶ permissions ─▶ rate  │
//!   │                                                       limit ──┐  │
//!   │        middleware a ─▶ middleware b ─▶ Command::handle ◀──────┘  │
//!   └──────────────────────────────────────────────┬───────────────────┘
//!                                                  ▼
//!                                             Transport (replies)
//! ```
//!
//! - **Core** (`switchboard-core`): inbound events, the outbound [`Transport`](core::Transport)
//! - **Framework** (`switchboard-framework`): commands, registry, policy and the [`Mux`](framework::Mux)
//! - **Runtime** (`switchboard-runtime`): configuration, logging and the event loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Command for Ping {
//!     fn settings(&self) -> CommandSettings {
//!         CommandSettings::new("ping", "Checks that the bot is alive")
//!     }
//!
//!     async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
//!         ctx.reply("pong").await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     let mut mux = config.mux_builder()?;
//!     mux.use_middleware(Middleware::layer(TraceLayer));
//!     mux.register(Ping)?;
//!     mux.register(HelpCommand::default())?;
//!     let mux = mux.initialize().await?;
//!
//!     SwitchboardRuntime::from_config(&config, mux, transport)
//!         .run(source)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `typed-args`: clap-backed [`Context::parse_args`](framework::Context) (default)
//! - `toml-config` (default), `yaml-config`, `json-config`: configuration file formats
//! - `json-log`: JSON log lines

pub use switchboard_core as core;
pub use switchboard_framework as framework;
pub use switchboard_runtime as runtime;

/// Commonly used types for building a bot.
///
/// ```rust,ignore
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    // Runtime - entry point
    pub use switchboard_runtime::{
        ConfigLoader, ErrorReportLayer, EventSource, LoggingBuilder, SwitchboardConfig,
        SwitchboardRuntime,
    };

    // Commands and dispatch
    pub use switchboard_framework::{
        BoxError, Command, CommandSettings, Context, HelpCommand, Middleware, Mux, MuxBuilder,
        Next, Outcome, PermissionTable, SimpleCommand, TraceLayer,
    };

    // Transport seam
    pub use switchboard_core::{
        Author, BoxedTransport, ChatEvent, Embed, Transport, TransportError, TransportResult,
    };

    pub use switchboard_framework::async_trait;
}
