//! Permission level resolution.
//!
//! Levels are derived fresh for every check from the guild snapshot, the
//! caller's membership and the global bot-admin allow-list. Nothing is
//! cached between dispatches.

use gatebot_model::{Capability, Guild, Member, User, UserId};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::data::GuildSettings;
use crate::error::GateSpecError;

/// Ordered caller privilege. Higher variants include every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    Default,
    Moderator,
    Administrator,
    BotAdmin,
}

impl PermissionLevel {
    /// Name used in gate specifications.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Moderator => "moderator",
            Self::Administrator => "administrator",
            Self::BotAdmin => "bot-admin",
        }
    }

    /// Language key of the level's display name.
    pub fn i18n_key(self) -> &'static str {
        match self {
            Self::Default => "permissionLevels.default",
            Self::Moderator => "permissionLevels.moderator",
            Self::Administrator => "permissionLevels.administrator",
            Self::BotAdmin => "permissionLevels.botAdmin",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = GateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "everyone" => Ok(Self::Default),
            "moderator" | "mod" => Ok(Self::Moderator),
            "administrator" | "admin" => Ok(Self::Administrator),
            "bot-admin" | "botadmin" | "bot_admin" => Ok(Self::BotAdmin),
            _ => Err(GateSpecError::InvalidPermissionLevel(s.trim().to_string())),
        }
    }
}

/// Maps a caller to a [`PermissionLevel`].
#[derive(Debug, Default)]
pub struct PermissionResolver {
    bot_admins: HashSet<UserId>,
}

impl PermissionResolver {
    pub fn new(bot_admins: HashSet<UserId>) -> Self {
        Self { bot_admins }
    }

    pub fn is_bot_admin(&self, user: UserId) -> bool {
        self.bot_admins.contains(&user)
    }

    /// Highest applicable level for `author`.
    ///
    /// Bot admins are recognised everywhere, including direct messages.
    /// Outside a guild everybody else is `Default`.
    pub fn resolve(
        &self,
        settings: Option<&GuildSettings>,
        guild: Option<&Guild>,
        member: Option<&Member>,
        author: &User,
    ) -> PermissionLevel {
        if self.is_bot_admin(author.id) {
            return PermissionLevel::BotAdmin;
        }
        let (Some(guild), Some(member)) = (guild, member) else {
            return PermissionLevel::Default;
        };

        let empty = GuildSettings::default();
        let settings = settings.unwrap_or(&empty);

        if guild.owner_id == member.user.id
            || member.capabilities.contains(Capability::Administrator)
            || member.has_any_role(&settings.admin_roles)
            || settings.admin_users.contains(&member.user.id)
        {
            return PermissionLevel::Administrator;
        }
        if member.has_any_role(&settings.moderator_roles)
            || member.capabilities.contains(Capability::ManageServer)
        {
            return PermissionLevel::Moderator;
        }
        PermissionLevel::Default
    }
}
