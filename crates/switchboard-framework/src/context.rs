//! Per-invocation request context.
//!
//! A [`Context`] is built by the multiplexer for exactly one command
//! invocation and handed (behind an `Arc`) through the middleware pipeline
//! to the command's handler. It is never shared between invocations and a
//! handler must not keep it beyond its own call.
//!
//! ```rust,ignore
//! async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
//!     ctx.typing().await?;
//!     let who = ctx.arg(0).unwrap_or("everyone");
//!     ctx.reply(&format!("Hello, {who}!")).await?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use switchboard_core::{Author, BoxedTransport, ChatEvent, Embed, TransportResult};

use crate::command::Descriptor;
use crate::dispatcher::Mux;

/// The request context handed to command handlers.
pub struct Context {
    event: ChatEvent,
    /// Name as typed by the user (may differ from the resolved name when
    /// fuzzy matching kicked in).
    invoked_as: String,
    args: Vec<String>,
    descriptor: Descriptor,
    transport: BoxedTransport,
    mux: Mux,
}

impl Context {
    pub(crate) fn new(
        event: ChatEvent,
        invoked_as: String,
        args: Vec<String>,
        descriptor: Descriptor,
        transport: BoxedTransport,
        mux: Mux,
    ) -> Self {
        Self {
            event,
            invoked_as,
            args,
            descriptor,
            transport,
            mux,
        }
    }

    /// Derives a context addressed to another command, keeping the event,
    /// transport and multiplexer. Used by `help <command>`.
    pub fn for_command(&self, descriptor: Descriptor, args: Vec<String>) -> Self {
        Self {
            event: self.event.clone(),
            invoked_as: descriptor.name().to_string(),
            args,
            descriptor,
            transport: self.transport.clone(),
            mux: self.mux.clone(),
        }
    }

    // ─── Request data ─────────────────────────────────────────────────────────

    /// The raw inbound event.
    pub fn event(&self) -> &ChatEvent {
        &self.event
    }

    pub fn author(&self) -> &Author {
        &self.event.author
    }

    pub fn channel_id(&self) -> &str {
        &self.event.channel_id
    }

    /// The resolved command name.
    pub fn command(&self) -> &str {
        self.descriptor.name()
    }

    /// The command name exactly as the user typed it.
    pub fn invoked_as(&self) -> &str {
        &self.invoked_as
    }

    /// Argument tokens following the command name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The descriptor the invocation resolved to.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The multiplexer that dispatched this invocation.
    pub fn mux(&self) -> &Mux {
        &self.mux
    }

    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    // ─── Replies ──────────────────────────────────────────────────────────────

    /// Sends a plain text message to the invoking channel.
    pub async fn reply(&self, content: &str) -> TransportResult<String> {
        self.transport
            .send_text(&self.event.channel_id, content)
            .await
    }

    /// Sends a rich reply to the invoking channel.
    pub async fn reply_embed(&self, embed: &Embed) -> TransportResult<String> {
        self.transport
            .send_embed(&self.event.channel_id, embed)
            .await
    }

    /// Shows a typing indicator in the invoking channel.
    pub async fn typing(&self) -> TransportResult<()> {
        self.transport.typing(&self.event.channel_id).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command())
            .field("invoked_as", &self.invoked_as)
            .field("args", &self.args)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}
