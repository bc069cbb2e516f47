//! Platform capabilities (channel permissions).
//!
//! A [`Capabilities`] value is the effective permission set of a member (or
//! the bot itself) in one channel. Names follow the platform's dotted
//! `<group>.<permission>` form so they can be written directly in gate
//! specifications such as `require:bot,text.manage_messages`.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A single platform capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Capability {
    /// Grants every other capability.
    Administrator,
    /// Edit guild settings.
    ManageServer,
    /// Create, edit and assign roles.
    ManageRoles,
    /// Create and edit channels.
    ManageChannels,
    /// Kick members.
    KickMembers,
    /// Ban members.
    BanMembers,
    /// Change other members' nicknames.
    ManageNicknames,
    /// See the channel.
    ReadMessages,
    /// Post messages.
    SendMessages,
    /// Post rich embeds.
    EmbedLinks,
    /// Upload files.
    AttachFiles,
    /// Read earlier messages.
    ReadMessageHistory,
    /// Delete and pin messages of others.
    ManageMessages,
    /// React to messages.
    AddReactions,
    /// Use `@everyone` and `@here`.
    MentionEveryone,
    /// Use emojis from other guilds.
    UseExternalEmojis,
    /// Join voice channels.
    VoiceConnect,
    /// Speak in voice channels.
    VoiceSpeak,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Capability; 18] = [
        Capability::Administrator,
        Capability::ManageServer,
        Capability::ManageRoles,
        Capability::ManageChannels,
        Capability::KickMembers,
        Capability::BanMembers,
        Capability::ManageNicknames,
        Capability::ReadMessages,
        Capability::SendMessages,
        Capability::EmbedLinks,
        Capability::AttachFiles,
        Capability::ReadMessageHistory,
        Capability::ManageMessages,
        Capability::AddReactions,
        Capability::MentionEveryone,
        Capability::UseExternalEmojis,
        Capability::VoiceConnect,
        Capability::VoiceSpeak,
    ];

    /// Dotted platform name, e.g. `text.manage_messages`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Administrator => "general.administrator",
            Self::ManageServer => "general.manage_server",
            Self::ManageRoles => "general.manage_roles",
            Self::ManageChannels => "general.manage_channels",
            Self::KickMembers => "general.kick_members",
            Self::BanMembers => "general.ban_members",
            Self::ManageNicknames => "general.manage_nicknames",
            Self::ReadMessages => "text.read_messages",
            Self::SendMessages => "text.send_messages",
            Self::EmbedLinks => "text.embed_links",
            Self::AttachFiles => "text.attach_files",
            Self::ReadMessageHistory => "text.read_message_history",
            Self::ManageMessages => "text.manage_messages",
            Self::AddReactions => "text.add_reactions",
            Self::MentionEveryone => "text.mention_everyone",
            Self::UseExternalEmojis => "text.use_external_emojis",
            Self::VoiceConnect => "voice.connect",
            Self::VoiceSpeak => "voice.speak",
        }
    }

    #[inline]
    const fn bit(self) -> u64 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.name() == needle)
            .ok_or_else(|| ModelError::UnknownCapability(s.trim().to_string()))
    }
}

/// A set of capabilities, stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<String>", into = "Vec<String>")
)]
pub struct Capabilities(u64);

impl Capabilities {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every capability.
    pub fn all() -> Self {
        Capability::ALL.iter().copied().collect()
    }

    /// Whether the set is empty.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of capabilities in the set.
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Add a capability.
    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    /// Remove a capability.
    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, cap: Capability) -> Self {
        self.insert(cap);
        self
    }

    /// Raw membership test. Does not expand `general.administrator`.
    pub const fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Effective membership test: administrators hold every capability.
    pub const fn allows(&self, cap: Capability) -> bool {
        self.contains(Capability::Administrator) || self.contains(cap)
    }

    /// Capabilities of `required` that this set does not grant.
    pub fn missing(&self, required: Capabilities) -> Capabilities {
        if self.contains(Capability::Administrator) {
            return Capabilities::empty();
        }
        Capabilities(required.0 & !self.0)
    }

    /// Iterate the capabilities in bit order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.iter().copied().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut caps = Capabilities::empty();
        for cap in iter {
            caps.insert(cap);
        }
        caps
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for cap in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(cap.name())?;
            first = false;
        }
        Ok(())
    }
}

/// Parses a comma separated list of dotted names.
impl FromStr for Capabilities {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Capability>)
            .collect()
    }
}

impl TryFrom<Vec<String>> for Capabilities {
    type Error = ModelError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().map(|n| n.parse::<Capability>()).collect()
    }
}

impl From<Capabilities> for Vec<String> {
    fn from(caps: Capabilities) -> Self {
        caps.iter().map(|c| c.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() {
        for cap in Capability::ALL {
            assert_eq!(cap.name().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(
            " Text.Manage_Messages ".parse::<Capability>().unwrap(),
            Capability::ManageMessages
        );
    }

    #[test]
    fn unknown_name_is_reported() {
        let err = "text.fly".parse::<Capability>().unwrap_err();
        assert_eq!(err, ModelError::UnknownCapability("text.fly".to_string()));
    }

    #[test]
    fn missing_lists_only_absent_capabilities() {
        let held: Capabilities = "text.send_messages,text.manage_messages".parse().unwrap();
        let required: Capabilities = "text.manage_messages,text.read_message_history"
            .parse()
            .unwrap();
        let missing = held.missing(required);
        assert_eq!(missing.len(), 1);
        assert!(missing.contains(Capability::ReadMessageHistory));
        assert_eq!(missing.to_string(), "text.read_message_history");
    }

    #[test]
    fn administrator_satisfies_everything() {
        let admin = Capabilities::empty().with(Capability::Administrator);
        assert!(admin.allows(Capability::BanMembers));
        assert!(!admin.contains(Capability::BanMembers));
        assert!(admin.missing(Capabilities::all()).is_empty());
    }

    #[test]
    fn display_joins_with_commas() {
        let caps = Capabilities::empty()
            .with(Capability::EmbedLinks)
            .with(Capability::SendMessages);
        assert_eq!(caps.to_string(), "text.send_messages, text.embed_links");
    }
}
