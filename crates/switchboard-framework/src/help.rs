//! The built-in help command.
//!
//! `HelpCommand` is an ordinary rich command; nothing in the dispatcher
//! treats it specially. Register it like any other command under the name
//! users should type.
//!
//! - `!help` lists every registered command, one `` `!name`: help text ``
//!   line each, in registration order.
//! - `!help <command>` lets the command answer through
//!   [`Command::handle_help`] and falls back to its static help text.

use async_trait::async_trait;
use tower::BoxError;
use tracing::debug;

use crate::command::{Command, CommandSettings, Descriptor};
use crate::context::Context;

/// Aggregates help text across the registry.
#[derive(Debug, Clone)]
pub struct HelpCommand {
    settings: CommandSettings,
}

impl HelpCommand {
    pub fn new(name: impl Into<String>, help_text: impl Into<String>) -> Self {
        Self {
            settings: CommandSettings::new(name, help_text),
        }
    }
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new("help", "Displays help information")
    }
}

fn help_line(prefix: &str, descriptor: &Descriptor) -> String {
    format!("`{prefix}{}`: {}", descriptor.name(), descriptor.help_text())
}

#[async_trait]
impl Command for HelpCommand {
    fn settings(&self) -> CommandSettings {
        self.settings.clone()
    }

    async fn handle(&self, ctx: &Context) -> Result<(), BoxError> {
        let mux = ctx.mux();

        let Some(target) = ctx.arg(0) else {
            let listing = mux
                .descriptors()
                .map(|descriptor| help_line(mux.prefix(), descriptor))
                .collect::<Vec<_>>()
                .join("\n");
            ctx.reply(&listing).await?;
            return Ok(());
        };

        let Some(descriptor) = mux.resolve(target) else {
            let text = mux.errors().command_not_found.as_str();
            if !text.is_empty() {
                ctx.reply(text).await?;
            }
            return Ok(());
        };

        if let Descriptor::Rich(rich) = descriptor {
            let sub = ctx.for_command(descriptor.clone(), ctx.args()[1..].to_vec());
            if rich.command().handle_help(&sub).await {
                debug!(command = descriptor.name(), "Command produced custom help");
                return Ok(());
            }
        }

        ctx.reply(&help_line(mux.prefix(), descriptor)).await?;
        Ok(())
    }
}
