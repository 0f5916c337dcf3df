//! Eligibility filtering for inbound events.

use serde::{Deserialize, Serialize};
use switchboard_core::{ChatEvent, MessageKind};

/// Static dispatch policy flags. Every flag defaults to `false`, so an
/// unconfigured multiplexer considers every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Drop messages sent outside of a guild.
    pub ignore_dms: bool,
    /// Drop messages authored by bot accounts.
    pub ignore_bots: bool,
    /// Drop messages whose subtype is not [`MessageKind::Default`].
    pub ignore_non_default: bool,
    /// Drop messages with an empty body.
    pub ignore_empty: bool,
}

/// Why an event was silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    DirectMessage,
    Bot,
    NonDefault,
    Empty,
}

impl Options {
    /// Returns the first reason `event` is ineligible, if any.
    pub fn filter(&self, event: &ChatEvent) -> Option<DropReason> {
        if self.ignore_dms && event.is_direct() {
            return Some(DropReason::DirectMessage);
        }
        if self.ignore_bots && event.author.bot {
            return Some(DropReason::Bot);
        }
        if self.ignore_non_default && event.kind != MessageKind::Default {
            return Some(DropReason::NonDefault);
        }
        if self.ignore_empty && event.is_empty() {
            return Some(DropReason::Empty);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::Author;

    fn strict() -> Options {
        Options {
            ignore_dms: true,
            ignore_bots: true,
            ignore_non_default: true,
            ignore_empty: true,
        }
    }

    #[test]
    fn test_default_is_permissive() {
        let event = ChatEvent::new("1", "dm", "")
            .author(Author {
                bot: true,
                ..Default::default()
            })
            .kind(MessageKind::MemberJoin);
        assert_eq!(Options::default().filter(&event), None);
    }

    #[test]
    fn test_each_flag_drops() {
        let guild = ChatEvent::new("1", "c", "!ping").guild("g");

        assert_eq!(
            strict().filter(&ChatEvent::new("1", "dm", "!ping")),
            Some(DropReason::DirectMessage)
        );
        assert_eq!(
            strict().filter(&guild.clone().author(Author {
                bot: true,
                ..Default::default()
            })),
            Some(DropReason::Bot)
        );
        assert_eq!(
            strict().filter(&guild.clone().kind(MessageKind::ChannelPinned)),
            Some(DropReason::NonDefault)
        );
        assert_eq!(
            strict().filter(&ChatEvent::new("1", "c", " ").guild("g")),
            Some(DropReason::Empty)
        );
        assert_eq!(strict().filter(&guild), None);
    }
}
