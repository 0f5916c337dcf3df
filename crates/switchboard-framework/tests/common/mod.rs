//! Shared fixtures for the multiplexer integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use switchboard_core::{Author, BoxedTransport, ChatEvent, Embed, Transport, TransportResult};

/// A transport that records every outbound message.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    next_id: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every message sent so far as `(channel, content)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Only the message bodies.
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn boxed(self: &Arc<Self>) -> BoxedTransport {
        Arc::clone(self) as BoxedTransport
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        self.sent
            .lock()
            .push((channel_id.to_string(), content.to_string()));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("out-{id}"))
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> TransportResult<String> {
        self.send_text(channel_id, &embed.to_plain_text()).await
    }
}

/// A guild message from `user` holding `roles`.
pub fn message(user: &str, roles: &[&str], content: &str) -> ChatEvent {
    ChatEvent::new("m1", "general", content).guild("g1").author(Author {
        id: user.to_string(),
        name: user.to_string(),
        bot: false,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    })
}
