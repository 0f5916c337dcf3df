//! # Switchboard Core
//!
//! Transport-facing building blocks shared by every Switchboard crate.
//!
//! The command multiplexer never speaks a chat protocol itself. It consumes
//! [`ChatEvent`]s produced by a transport collaborator and answers through
//! the [`Transport`] trait, which exposes the three reply primitives a
//! handler needs:
//!
//! - plain text messages
//! - rich [`Embed`] replies (title, description, colour, fields, image, footer)
//! - a typing indicator
//!
//! ```text
//! ┌─────────────┐  ChatEvent   ┌───────────┐  Context   ┌──────────┐
//! │  Transport  │─────────────▶│    Mux    │───────────▶│ Command  │
//! │ (platform)  │◀─────────────│(framework)│◀───────────│ handler  │
//! └─────────────┘  send/embed  └───────────┘   reply    └──────────┘
//! ```

pub mod embed;
pub mod error;
pub mod event;
pub mod transport;

pub use embed::{Embed, EmbedAuthor, EmbedField};
pub use error::{TransportError, TransportResult};
pub use event::{Attachment, Author, ChatEvent, MessageKind};
pub use transport::{BoxedTransport, TimeoutTransport, Transport};
