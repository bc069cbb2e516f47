//! Snapshots of platform entities as delivered with an inbound event.

use crate::capability::Capabilities;
use crate::id::{ChannelId, GuildId, RoleId, UserId};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    /// Account id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Whether the account is a bot.
    #[cfg_attr(feature = "serde", serde(default))]
    pub bot: bool,
}

impl User {
    /// The platform mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    /// Role id.
    pub id: RoleId,
    /// Role name.
    pub name: String,
}

/// A guild (server).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Guild {
    /// Guild id.
    pub id: GuildId,
    /// Guild name.
    pub name: String,
    /// The owning user.
    pub owner_id: UserId,
    /// Roles defined in the guild.
    #[cfg_attr(feature = "serde", serde(default))]
    pub roles: Vec<Role>,
}

/// A user's membership in a guild, with their effective channel capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    /// The member's account.
    pub user: User,
    /// Guild-local nickname.
    #[cfg_attr(feature = "serde", serde(default))]
    pub nickname: Option<String>,
    /// Assigned roles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub roles: Vec<RoleId>,
    /// Effective capabilities in the channel the event came from.
    #[cfg_attr(feature = "serde", serde(default))]
    pub capabilities: Capabilities,
}

impl Member {
    /// Nickname if set, otherwise the account name.
    pub fn effective_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.name)
    }

    /// Whether the member holds any of `roles`.
    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

/// Channel flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelKind {
    /// A guild text channel.
    Text,
    /// A direct-message channel.
    Private,
}

/// A channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Channel name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Text or private.
    pub kind: ChannelKind,
}

impl Channel {
    /// Whether this is a direct-message channel.
    pub fn is_private(&self) -> bool {
        self.kind == ChannelKind::Private
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_name_prefers_nickname() {
        let mut member = Member {
            user: User {
                id: UserId(1),
                name: "alice".into(),
                bot: false,
            },
            nickname: None,
            roles: vec![RoleId(7)],
            capabilities: Capabilities::empty(),
        };
        assert_eq!(member.effective_name(), "alice");
        member.nickname = Some("Al".into());
        assert_eq!(member.effective_name(), "Al");
        assert!(member.has_any_role(&[RoleId(3), RoleId(7)]));
        assert!(!member.has_any_role(&[]));
    }
}
