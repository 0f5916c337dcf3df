//! Console Bot Example
//!
//! Drives the multiplexer from the terminal: every line typed on stdin
//! becomes a guild message in the `console` channel, and replies are
//! printed to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --user alice --role mod
//! ```
//!
//! Then type `!help`, `!ping`, `!echo hello` or `!repeat 3 hi`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use switchboard::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const CHANNEL: &str = "console";

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Chat with a Switchboard bot from the terminal")]
struct Cli {
    /// Configuration file; the default search path is used otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User id the typed messages are sent as.
    #[arg(short, long, default_value = "console-user")]
    user: String,

    /// Roles held by the user (repeatable).
    #[arg(short, long = "role")]
    roles: Vec<String>,
}

// ============================================================================
// Transport & Event Source
// ============================================================================

/// Prints every reply to stdout.
#[derive(Default)]
struct StdoutTransport {
    next_id: AtomicU64,
}

impl StdoutTransport {
    async fn print(&self, channel_id: &str, text: &str) -> TransportResult<String> {
        let mut stdout = tokio::io::stdout();
        let line = format!("[#{channel_id}] {text}\n");
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

#[async_trait]
impl Transport for StdoutTransport {
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        self.print(channel_id, content).await
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        self.print(channel_id, &embed.to_plain_text()).await
    }
}

/// Turns stdin lines into chat events until EOF.
fn stdin_events(author: Author) -> mpsc::Receiver<ChatEvent> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut seq = 0u64;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    seq += 1;
                    let event = ChatEvent::new(seq.to_string(), CHANNEL, line)
                        .guild("terminal")
                        .author(author.clone());
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            }
        }
    });

    rx
}

// ============================================================================
// Commands
// ============================================================================

struct Ping;

#[async_trait]
impl Command for Ping {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("ping", "Checks that the bot is alive")
    }

    async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
        ctx.reply("Pong!").await?;
        Ok(())
    }
}

struct Echo;

#[async_trait]
impl Command for Echo {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("echo", "Repeats the arguments back")
    }

    async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
        if ctx.args().is_empty() {
            ctx.reply("Nothing to echo.").await?;
        } else {
            ctx.reply(&ctx.args().join(" ")).await?;
        }
        Ok(())
    }
}

/// Arguments of `!repeat`.
#[derive(Parser, Debug)]
struct RepeatArgs {
    /// How many times to repeat the text.
    #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
    times: u8,
    /// Text to repeat.
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
    /// Separator placed between repetitions.
    #[arg(short, long, default_value = " ")]
    separator: String,
}

struct Repeat;

#[async_trait]
impl Command for Repeat {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("repeat", "Repeats text a few times")
            .rate_limit(3, Duration::from_secs(30))
    }

    async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
        let Some(args) = ctx.parse_args_or_reply::<RepeatArgs>().await? else {
            return Ok(());
        };
        let text = args.text.join(" ");
        let out = vec![text.as_str(); usize::from(args.times)].join(&args.separator);
        ctx.reply(&out).await?;
        Ok(())
    }

    async fn handle_help(&self, ctx: &Context) -> bool {
        let usage = "`repeat <TIMES> <TEXT>... [--separator <SEP>]`: repeats TEXT 1 to 5 times";
        ctx.reply(usage).await.is_ok()
    }
}

struct WhoAmI;

#[async_trait]
impl Command for WhoAmI {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("whoami", "Shows who the bot thinks you are")
    }

    async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
        let author = ctx.author();
        let roles = if author.roles.is_empty() {
            "(none)".to_string()
        } else {
            author.roles.join(", ")
        };
        let embed = Embed::new()
            .title("Who am I")
            .inline_field("User", author.id.clone())
            .inline_field("Roles", roles)
            .field("Channel", ctx.channel_id());
        ctx.reply_embed(&embed).await?;
        Ok(())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;

    let mut builder = config.mux_builder()?;
    builder.use_middleware(Middleware::layer(TraceLayer));
    if let Some(channel) = &config.bot.error_channel {
        builder.use_middleware(ErrorReportLayer::new(channel).into_middleware());
    }
    builder
        .register(Ping)?
        .register(Echo)?
        .register(Repeat)?
        .register(WhoAmI)?
        .register(HelpCommand::default())?;
    let mux = builder.initialize().await?;

    let transport: BoxedTransport = Arc::new(StdoutTransport::default());
    let runtime = SwitchboardRuntime::from_config(&config, mux, transport);

    let author = Author {
        id: cli.user.clone(),
        name: cli.user,
        bot: false,
        roles: cli.roles,
    };
    info!(prefix = %config.bot.prefix, "Console bot ready, type a command");

    let stats = runtime.run(stdin_events(author)).await?;
    info!(?stats, "Console bot stopped");

    Ok(())
}
