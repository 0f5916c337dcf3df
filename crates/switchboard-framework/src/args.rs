//! Typed argument parsing with clap.
//!
//! The command name as typed is used as clap's binary name, so usage and
//! error messages read like `Usage: roll [SIDES]`.
//!
//! ```rust,ignore
//! #[derive(clap::Parser)]
//! struct RollArgs {
//!     #[arg(default_value_t = 6)]
//!     sides: u32,
//! }
//!
//! async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
//!     let Some(args) = ctx.parse_args_or_reply::<RollArgs>().await? else {
//!         return Ok(());
//!     };
//!     // ...
//! }
//! ```

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use switchboard_core::TransportResult;
use tracing::debug;

use crate::context::Context;

impl Context {
    /// Parses the invocation's argument tokens as `T`.
    pub fn parse_args<T: Parser>(&self) -> Result<T, clap::Error> {
        let argv = std::iter::once(self.invoked_as()).chain(self.args().iter().map(String::as_str));
        T::try_parse_from(argv)
    }

    /// Parses the arguments as `T`, replying with clap's error text followed
    /// by the usage line on failure.
    ///
    /// Returns `Ok(None)` when parsing failed and the reply was sent.
    pub async fn parse_args_or_reply<T: Parser>(&self) -> TransportResult<Option<T>> {
        match self.parse_args::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => {
                if err.kind() != ErrorKind::DisplayHelp {
                    debug!(command = self.command(), kind = ?err.kind(), "Argument parsing failed");
                }
                self.reply(&self.usage_reply::<T>(&err)).await?;
                Ok(None)
            }
        }
    }

    fn usage_reply<T: CommandFactory>(&self, err: &clap::Error) -> String {
        let text = err.to_string();
        // Help output and some errors already carry the usage block.
        if text.contains("Usage:") {
            return text;
        }
        let usage = T::command()
            .bin_name(self.invoked_as().to_string())
            .render_usage();
        format!("{}\n{usage}", text.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use switchboard_core::{ChatEvent, Embed, Transport};
    use tower::BoxError;

    use super::*;
    use crate::{Command, CommandSettings, MuxBuilder};

    #[derive(Parser, Debug, PartialEq)]
    struct RollArgs {
        #[arg(default_value_t = 6)]
        sides: u32,
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    }

    struct Roll;

    #[async_trait]
    impl Command for Roll {
        fn settings(&self) -> CommandSettings {
            CommandSettings::new("roll", "Rolls dice")
        }

        async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<String>>);

    #[async_trait]
    impl Transport for Outbox {
        async fn send_text(&self, _channel_id: &str, content: &str) -> TransportResult<String> {
            self.0.lock().push(content.to_string());
            Ok("id".into())
        }

        async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
            self.send_text(channel_id, &embed.to_plain_text()).await
        }
    }

    async fn context(args: &[&str], outbox: Arc<Outbox>) -> Context {
        let mut builder = MuxBuilder::new("!").unwrap();
        builder.register(Roll).unwrap();
        let mux = builder.initialize().await.unwrap();
        let descriptor = mux.lookup("roll").cloned().unwrap();
        Context::new(
            ChatEvent::new("m1", "general", "!roll"),
            "roll".to_string(),
            args.iter().map(|a| a.to_string()).collect(),
            descriptor,
            outbox,
            mux,
        )
    }

    #[tokio::test]
    async fn test_parse_typed_arguments() {
        let ctx = context(&["20", "--count", "3"], Arc::default()).await;
        assert_eq!(
            ctx.parse_args::<RollArgs>().unwrap(),
            RollArgs { sides: 20, count: 3 }
        );

        let ctx = context(&[], Arc::default()).await;
        assert_eq!(
            ctx.parse_args::<RollArgs>().unwrap(),
            RollArgs { sides: 6, count: 1 }
        );
    }

    #[tokio::test]
    async fn test_invalid_arguments_reply_with_usage() {
        let outbox = Arc::new(Outbox::default());
        let ctx = context(&["many"], Arc::clone(&outbox)).await;

        let parsed = ctx.parse_args_or_reply::<RollArgs>().await.unwrap();

        assert!(parsed.is_none());
        let sent = outbox.0.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("error: invalid value 'many'"));
        assert!(sent[0].contains("Usage: roll"));
        assert_eq!(sent[0].matches("Usage:").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_argument_reply_has_single_usage() {
        #[derive(Parser, Debug)]
        struct Required {
            target: String,
        }

        let outbox = Arc::new(Outbox::default());
        let ctx = context(&[], Arc::clone(&outbox)).await;

        let parsed = ctx.parse_args_or_reply::<Required>().await.unwrap();

        assert!(parsed.is_none());
        let sent = outbox.0.lock();
        assert!(sent[0].contains("<TARGET>"));
        assert_eq!(sent[0].matches("Usage:").count(), 1);
    }
}
