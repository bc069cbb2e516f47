//! Inbound message events.

use crate::entity::{Channel, Guild, Member, User};
use crate::id::{MessageId, UserId};

/// Which gateway shard delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShardInfo {
    /// Zero-based shard id.
    pub id: u32,
    /// Total number of shards.
    pub total: u32,
}

impl std::fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.id, self.total)
    }
}

/// A message posted in a channel the bot can see.
///
/// `guild` and `member` are `None` for direct messages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InboundMessage {
    /// Message id.
    pub id: MessageId,
    /// Raw content, including any prefix.
    pub content: String,
    /// The author.
    pub author: User,
    /// The author's guild membership.
    #[cfg_attr(feature = "serde", serde(default))]
    pub member: Option<Member>,
    /// The guild the message was posted in.
    #[cfg_attr(feature = "serde", serde(default))]
    pub guild: Option<Guild>,
    /// The channel the message was posted in.
    pub channel: Channel,
    /// Users mentioned in the content, in order of appearance.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mentions: Vec<User>,
    /// Whether the content pings `@everyone` or `@here`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mentions_everyone: bool,
    /// Delivering shard.
    #[cfg_attr(feature = "serde", serde(default))]
    pub shard: ShardInfo,
}

impl InboundMessage {
    /// Whether the message was posted in a guild channel.
    pub fn is_guild_message(&self) -> bool {
        self.guild.is_some() && !self.channel.is_private()
    }

    /// Whether `user` is mentioned in the message.
    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.iter().any(|u| u.id == user)
    }
}
