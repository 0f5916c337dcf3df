//! Inbound chat events.
//!
//! A [`ChatEvent`] is the only thing the multiplexer needs to know about a
//! message delivered by the platform: who sent it, where, what it says and
//! enough flags to decide whether it is eligible for dispatch at all.

use serde::{Deserialize, Serialize};

// ============================================================================
// Message Kind
// ============================================================================

/// Platform message subtype.
///
/// Only [`MessageKind::Default`] is an ordinary user-authored message; the
/// rest are system notices or special message forms that a bot usually wants
/// to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A regular message.
    #[default]
    Default,
    /// A reply to another message.
    Reply,
    /// A system notice that a message was pinned.
    ChannelPinned,
    /// A system notice that a member joined.
    MemberJoin,
    /// Any other subtype the transport does not map.
    Other,
}

// ============================================================================
// Author & Attachment
// ============================================================================

/// The user who sent a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform user identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub bot: bool,
    /// Role identifiers held by the author in the current guild.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub filename: String,
}

// ============================================================================
// ChatEvent
// ============================================================================

/// A message delivered by the transport collaborator.
///
/// # Example
///
/// ```rust
/// use switchboard_core::{Author, ChatEvent};
///
/// let event = ChatEvent::new("m1", "general", "!ping")
///     .guild("g1")
///     .author(Author { id: "u1".into(), ..Default::default() });
///
/// assert!(!event.is_direct());
/// assert_eq!(event.content, "!ping");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Message identifier.
    pub message_id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild (server) identifier; `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: Author,
    /// Raw message body.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl ChatEvent {
    /// Creates a direct-message event with a default author.
    pub fn new(
        message_id: impl Into<String>,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            channel_id: channel_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the guild the message was posted in.
    pub fn guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Sets the message author.
    pub fn author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    /// Sets the message subtype.
    pub fn kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns `true` if the message was sent outside of any guild.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }

    /// Returns `true` if the message body is empty or whitespace only.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_message_has_no_guild() {
        let event = ChatEvent::new("1", "dm", "hi");
        assert!(event.is_direct());
        assert!(!event.clone().guild("g").is_direct());
    }

    #[test]
    fn test_empty_body_detection() {
        assert!(ChatEvent::new("1", "c", "   ").is_empty());
        assert!(!ChatEvent::new("1", "c", "!x").is_empty());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let event: ChatEvent = serde_json::from_value(serde_json::json!({
            "message_id": "42",
            "channel_id": "general",
            "guild_id": "pulse",
            "author": { "id": "alice", "roles": ["mod"] },
            "content": "!help",
            "kind": "reply"
        }))
        .unwrap();

        assert_eq!(event.kind, MessageKind::Reply);
        assert_eq!(event.author.roles, vec!["mod"]);
        assert!(!event.author.bot);
        assert!(event.attachments.is_empty());
    }
}
