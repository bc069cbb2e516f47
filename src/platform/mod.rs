//! Chat platform collaborator.
//!
//! The dispatch pipeline talks to the platform only through [`ChatClient`].
//! Fire-and-forget actions (feedback messages, auto-deletes) go through the
//! [`Outbox`] so a dispatch never waits on the network unless it needs a
//! result.

pub mod console;
pub mod outbox;

use async_trait::async_trait;
use gatebot_model::{Capabilities, Capability, ChannelId, MessageId, OutboundMessage, User};
use thiserror::Error;

pub use outbox::Outbox;

/// Errors reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The bot lacks a capability the action needs.
    #[error("missing capability {0}")]
    MissingCapability(Capability),

    /// The referenced message does not exist (or was already deleted).
    #[error("unknown message {0}")]
    UnknownMessage(MessageId),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCapability(_) => "missing_capability",
            Self::UnknownMessage(_) => "unknown_message",
            Self::Unavailable(_) => "platform_unavailable",
        }
    }
}

/// Asynchronous primitives offered by the chat platform client.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The bot's own account.
    fn bot_user(&self) -> User;

    /// The bot's effective capabilities in `channel`.
    async fn self_capabilities(&self, channel: ChannelId) -> Result<Capabilities, PlatformError>;

    /// Post a message and return its id.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, PlatformError>;

    /// Delete a message.
    async fn delete_message(&self, channel: ChannelId, message: MessageId)
    -> Result<(), PlatformError>;

    /// Ids of the most recent messages in `channel`, newest first.
    async fn message_history(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError>;
}
