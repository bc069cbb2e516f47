//! Per-dispatch execution context.
//!
//! Everything a gate or command body may look at: the inbound message, the
//! configuration snapshot fetched for it, the resolved invocation and the
//! shared services. Built once by the dispatcher and never mutated.

use gatebot_model::{Channel, Guild, InboundMessage, Member, OutboundMessage, Tone, User};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use super::Services;
use crate::commands::{Command, CommandRegistry};
use crate::config::FeedbackConfig;
use crate::data::{ConfigBundle, GuildSettings, PlayerProfile, VerificationState};
use crate::i18n::LanguageBundle;
use crate::platform::ChatClient;
use crate::security::PermissionLevel;

/// How the message invoked its command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Arc<Command>,
    /// Prefix the message used, or the bot mention for mention invocations.
    pub prefix: String,
    /// Invoked by mentioning the bot rather than with the prefix.
    pub mentionable: bool,
    /// Fixed arguments contributed by a guild alias.
    pub alias_arguments: Vec<String>,
    /// User-supplied arguments after the trigger.
    pub user_arguments: Vec<String>,
    /// Raw text after the trigger.
    pub remainder: String,
}

pub struct ExecutionContext {
    message: Arc<InboundMessage>,
    bundle: ConfigBundle,
    invocation: Invocation,
    arguments: Vec<String>,
    language: Arc<LanguageBundle>,
    services: Arc<Services>,
    registry: Arc<CommandRegistry>,
}

impl ExecutionContext {
    pub fn new(
        message: Arc<InboundMessage>,
        bundle: ConfigBundle,
        invocation: Invocation,
        language: Arc<LanguageBundle>,
        services: Arc<Services>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        let arguments = invocation
            .alias_arguments
            .iter()
            .chain(&invocation.user_arguments)
            .cloned()
            .collect();
        Self {
            message,
            bundle,
            invocation,
            arguments,
            language,
            services,
            registry,
        }
    }

    // === Message data ===

    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    /// The author's guild membership. `None` in direct messages.
    pub fn member(&self) -> Option<&Member> {
        self.message.member.as_ref()
    }

    pub fn guild(&self) -> Option<&Guild> {
        self.message.guild.as_ref()
    }

    pub fn channel(&self) -> &Channel {
        &self.message.channel
    }

    pub fn is_guild_message(&self) -> bool {
        self.message.is_guild_message()
    }

    // === Invocation ===

    pub fn command(&self) -> &Command {
        &self.invocation.command
    }

    pub fn is_mentionable(&self) -> bool {
        self.invocation.mentionable
    }

    /// The prefix the caller used.
    pub fn prefix(&self) -> &str {
        &self.invocation.prefix
    }

    /// Alias arguments followed by the user's arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Alias arguments and the untokenized user text, space separated.
    pub fn content_raw(&self) -> String {
        let alias = self.invocation.alias_arguments.join(" ");
        match (alias.is_empty(), self.invocation.remainder.is_empty()) {
            (true, _) => self.invocation.remainder.clone(),
            (false, true) => alias,
            (false, false) => format!("{alias} {}", self.invocation.remainder),
        }
    }

    /// Users mentioned by the message, minus the bot mention that invoked it.
    pub fn mentioned_users(&self) -> &[User] {
        let mentions = &self.message.mentions;
        match mentions.first() {
            Some(first)
                if self.is_mentionable() && first.id == self.services.settings.bot_user_id =>
            {
                &mentions[1..]
            }
            _ => mentions,
        }
    }

    // === Configuration snapshot ===

    pub fn guild_settings(&self) -> Option<&GuildSettings> {
        self.bundle.guild.as_ref()
    }

    pub fn player(&self) -> Option<&PlayerProfile> {
        self.bundle.player.as_ref()
    }

    pub fn verification(&self) -> Option<&VerificationState> {
        self.bundle.verification.as_ref()
    }

    // === Services ===

    pub fn language(&self) -> &LanguageBundle {
        &self.language
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.services.client
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn feedback(&self) -> &FeedbackConfig {
        &self.services.settings.feedback
    }

    /// The caller's permission level, resolved on every call.
    pub fn permission_level(&self) -> PermissionLevel {
        self.services.permissions.resolve(
            self.guild_settings(),
            self.guild(),
            self.member(),
            self.author(),
        )
    }

    pub fn is_bot_admin(&self) -> bool {
        self.services.permissions.is_bot_admin(self.author().id)
    }

    // === Translation ===

    /// Translate a key relative to the command, `<category>.<command>.<key>`.
    pub fn translate(&self, key: &str, args: &[&dyn Display]) -> String {
        let command = self.command();
        let full = format!("{}.{}.{}", command.category.key(), command.name, key);
        self.translate_raw(&full, args)
    }

    /// Translate an absolute key.
    pub fn translate_raw(&self, key: &str, args: &[&dyn Display]) -> String {
        self.services.languages.translate(self.language(), key, args)
    }

    // === Feedback ===

    fn queue(&self, tone: Tone, text: String, after: Option<Duration>) {
        let message = OutboundMessage::new(tone, text);
        let outbox = &self.services.outbox;
        match after {
            Some(after) => outbox.send_expiring(self.channel().id, message, after),
            None => outbox.send(self.channel().id, message),
        }
    }

    /// Plain text reply.
    pub fn reply(&self, text: impl Into<String>) {
        self.queue(Tone::Plain, text.into(), None);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.queue(Tone::Info, text.into(), None);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.queue(Tone::Warning, text.into(), None);
    }

    pub fn success_expiring(&self, text: impl Into<String>, after: Duration) {
        self.queue(Tone::Success, text.into(), Some(after));
    }

    pub fn error_expiring(&self, text: impl Into<String>, after: Duration) {
        self.queue(Tone::Error, text.into(), Some(after));
    }
}
