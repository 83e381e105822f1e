//! Outbound message delivery.
//!
//! The engine composes every announcement itself and hands finished lines to
//! a [`MessageSink`]. The host decides what a channel or a private notice
//! means on its transport; tests use [`MemorySink`] and assert on the
//! recorded lines.

use std::cell::RefCell;

/// One delivered message, as recorded by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkMessage {
    /// Visible to the whole channel.
    Channel { channel: String, text: String },
    /// Visible to one player only.
    Private { nick: String, text: String },
}

/// Where finished game messages go.
pub trait MessageSink {
    /// Send `text` to everyone in `channel`.
    fn announce(&self, channel: &str, text: &str);

    /// Send `text` to `nick` alone.
    fn notify(&self, nick: &str, text: &str);
}

/// Sink that records messages in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: RefCell<Vec<SinkMessage>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<SinkMessage> {
        self.messages.borrow().clone()
    }

    /// Channel lines sent to `channel`, in order.
    #[must_use]
    pub fn channel_texts(&self, channel: &str) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|m| match m {
                SinkMessage::Channel { channel: c, text } if c == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Private lines sent to `nick`, in order.
    #[must_use]
    pub fn private_texts(&self, nick: &str) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|m| match m {
                SinkMessage::Private { nick: n, text } if n == nick => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Has any channel line containing `needle` been sent to `channel`?
    #[must_use]
    pub fn channel_contains(&self, channel: &str, needle: &str) -> bool {
        self.channel_texts(channel).iter().any(|t| t.contains(needle))
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl MessageSink for MemorySink {
    fn announce(&self, channel: &str, text: &str) {
        self.messages.borrow_mut().push(SinkMessage::Channel {
            channel: channel.to_string(),
            text: text.to_string(),
        });
    }

    fn notify(&self, nick: &str, text: &str) {
        self.messages.borrow_mut().push(SinkMessage::Private {
            nick: nick.to_string(),
            text: text.to_string(),
        });
    }
}
