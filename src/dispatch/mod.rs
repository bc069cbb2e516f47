//! Command dispatch.
//!
//! [`Dispatcher::dispatch`] takes one inbound message through the whole
//! pipeline:
//!
//! 1. ignore bot authors, fetch the caller's configuration bundle
//! 2. candidate check (prefix or bot mention)
//! 3. channel capability check (send and embed)
//! 4. tokenize, resolve the trigger or a guild alias
//! 5. build the [`ExecutionContext`] and drive the command's
//!    [`MiddlewareStack`] with the body as terminal
//! 6. classify whatever escaped the body and record it
//!
//! Nothing below `dispatch` can fail the caller: errors and panics in gates
//! or bodies are contained here and reported as a "not handled" result.

mod context;
mod stack;

#[cfg(test)]
mod tests;

use futures_util::FutureExt;
use gatebot_model::{
    Capability, InboundMessage, OutboundMessage, User, UserId, parse_user_mention,
    split_arguments,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, warn};

use crate::commands::{Command, CommandRegistry};
use crate::config::{Config, FeedbackConfig};
use crate::data::{DataStore, GuildSettings};
use crate::error::{CommandResult, Failure};
use crate::i18n::{LanguageBundle, Languages};
use crate::metrics;
use crate::platform::{ChatClient, Outbox};
use crate::security::PermissionResolver;
use crate::telemetry::{CommandTimer, spans};

pub use context::{ExecutionContext, Invocation};
pub use stack::{MiddlewareStack, StackOutcome};

/// Static dispatch settings taken from configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub default_prefix: String,
    pub bot_user_id: UserId,
    pub feedback: FeedbackConfig,
}

impl DispatchSettings {
    /// `bot` is the account the platform client is logged in as.
    pub fn from_config(config: &Config, bot: &User) -> Self {
        Self {
            default_prefix: config.bot.default_prefix.clone(),
            bot_user_id: bot.id,
            feedback: config.feedback.clone(),
        }
    }
}

/// Collaborators shared by every dispatch.
pub struct Services {
    pub client: Arc<dyn ChatClient>,
    pub store: Arc<dyn DataStore>,
    pub languages: Arc<Languages>,
    pub permissions: Arc<PermissionResolver>,
    pub outbox: Outbox,
    pub settings: DispatchSettings,
}

/// How a dispatch ended. Used as the `outcome` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The author is a bot.
    BotAuthor,
    /// The configuration bundle could not be fetched.
    StoreUnavailable,
    /// Neither prefixed nor addressed to the bot.
    NotCandidate,
    /// The bot cannot answer in the channel.
    MissingCapabilities,
    UnknownCommand,
    /// A gate halted the dispatch.
    Rejected,
    /// The body ran and returned `Ok`.
    Completed,
    InvalidArguments,
    /// The platform refused an action the body attempted.
    ExternalPermission,
    /// The body returned an unexpected error or panicked.
    Failed,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BotAuthor => "bot_author",
            Self::StoreUnavailable => "store_unavailable",
            Self::NotCandidate => "not_candidate",
            Self::MissingCapabilities => "missing_capabilities",
            Self::UnknownCommand => "unknown_command",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::InvalidArguments => "invalid_arguments",
            Self::ExternalPermission => "external_permission",
            Self::Failed => "failed",
        }
    }

    /// Only a completed body counts as handled.
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Entry point of the pipeline.
pub struct Dispatcher {
    services: Arc<Services>,
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    pub fn new(services: Arc<Services>, registry: Arc<CommandRegistry>) -> Self {
        Self { services, registry }
    }

    #[cfg(test)]
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    #[cfg(test)]
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Process one inbound message. Returns whether a command body completed.
    pub async fn dispatch(&self, message: Arc<InboundMessage>) -> bool {
        self.process(message).await.is_handled()
    }

    /// Process one inbound message and report how it ended.
    pub async fn process(&self, message: Arc<InboundMessage>) -> DispatchOutcome {
        let outcome = self.run(message).await;
        metrics::record_dispatch(outcome.as_str());
        outcome
    }

    async fn run(&self, message: Arc<InboundMessage>) -> DispatchOutcome {
        if message.author.bot {
            return DispatchOutcome::BotAuthor;
        }

        let guild_id = message.guild.as_ref().map(|g| g.id);
        let bundle = match self
            .services
            .store
            .fetch_bundle(guild_id, message.author.id)
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => {
                error!(
                    guild = ?guild_id,
                    author = %message.author.id,
                    code = e.error_code(),
                    error = %e,
                    "Failed to fetch configuration bundle"
                );
                return DispatchOutcome::StoreUnavailable;
            }
        };

        let settings = &self.services.settings;
        let prefix = bundle
            .guild
            .as_ref()
            .and_then(|g| g.prefix.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(&settings.default_prefix);

        let Some((rest, mentionable, used_prefix)) =
            strip_invocation(&message.content, prefix, settings.bot_user_id)
        else {
            return DispatchOutcome::NotCandidate;
        };

        let language = self
            .services
            .languages
            .resolve(bundle.guild.as_ref().and_then(|g| g.locale.as_deref()));

        if !self.check_capabilities(&message, &language).await {
            return DispatchOutcome::MissingCapabilities;
        }

        let tokens = split_arguments(rest);
        let Some((trigger, user_arguments)) = tokens.split_first() else {
            return DispatchOutcome::UnknownCommand;
        };
        let Some((command, alias_arguments)) = self.resolve(trigger, bundle.guild.as_ref()) else {
            debug!(trigger = %trigger, "Unknown command");
            return DispatchOutcome::UnknownCommand;
        };

        let remainder = rest
            .trim_start()
            .split_once(char::is_whitespace)
            .map(|(_, r)| r.trim().to_string())
            .unwrap_or_default();
        let invocation = Invocation {
            command: Arc::clone(&command),
            prefix: used_prefix,
            mentionable,
            alias_arguments,
            user_arguments: user_arguments.to_vec(),
            remainder,
        };

        let span = spans::dispatch(&message);
        let ctx = ExecutionContext::new(
            Arc::clone(&message),
            bundle,
            invocation,
            language,
            Arc::clone(&self.services),
            Arc::clone(&self.registry),
        );
        self.execute(&command, &ctx).instrument(span).await
    }

    /// In guild channels the bot must be able to send messages and embeds.
    async fn check_capabilities(&self, message: &InboundMessage, language: &LanguageBundle) -> bool {
        if !message.is_guild_message() {
            return true;
        }
        let channel = message.channel.id;
        let caps = match self.services.client.self_capabilities(channel).await {
            Ok(caps) => caps,
            Err(e) => {
                warn!(%channel, error = %e, "Could not read bot capabilities");
                return false;
            }
        };

        if !caps.allows(Capability::SendMessages) {
            debug!(%channel, "Cannot send messages, ignoring command");
            return false;
        }
        if !caps.allows(Capability::EmbedLinks) {
            debug!(%channel, "Cannot send embeds, warning in plain text");
            let text = self
                .services
                .languages
                .translate(language, "errors.missingEmbedLinks", &[]);
            self.services.outbox.send_expiring(
                channel,
                OutboundMessage::plain(text),
                self.services.settings.feedback.capability_warning(),
            );
            return false;
        }
        true
    }

    /// A registered trigger, or a guild alias pointing at one.
    fn resolve(
        &self,
        trigger: &str,
        settings: Option<&GuildSettings>,
    ) -> Option<(Arc<Command>, Vec<String>)> {
        let trigger = trigger.to_lowercase();
        if let Some(command) = self.registry.resolve(&trigger) {
            return Some((Arc::clone(command), Vec::new()));
        }

        let target = settings?.aliases.get(&trigger)?;
        let mut parts = split_arguments(target).into_iter();
        let command = self.registry.resolve(&parts.next()?)?;
        debug!(alias = %trigger, command = command.name, "Resolved guild alias");
        Some((Arc::clone(command), parts.collect()))
    }

    async fn execute(&self, command: &Command, ctx: &ExecutionContext) -> DispatchOutcome {
        let message = ctx.message();
        info!(
            command = command.name,
            category = %command.category,
            author = %format!("{} ({})", message.author.name, message.author.id),
            server = %ctx
                .guild()
                .map(|g| format!("{} ({})", g.name, g.id))
                .unwrap_or_else(|| "direct message".to_string()),
            channel = %format!("{} ({})", message.channel.name, message.channel.id),
            message = %message.id,
            shard = %message.shard,
            "Dispatching command"
        );

        command.record_use();
        let _timer = CommandTimer::new(command.name);

        let stack = MiddlewareStack::new(command.gates());
        let body = command.body();
        let run = AssertUnwindSafe(stack.run(ctx, || body.execute(ctx)))
            .catch_unwind()
            .await;
        conclude(ctx, run)
    }
}

/// Strip the prefix or leading bot mention from `content`.
///
/// Returns the rest of the content, whether the bot was mentioned and the
/// text that was stripped.
fn strip_invocation<'c>(
    content: &'c str,
    prefix: &str,
    bot: UserId,
) -> Option<(&'c str, bool, String)> {
    let content = content.trim_start();
    if let Some(rest) = content.strip_prefix(prefix) {
        return Some((rest, false, prefix.to_string()));
    }
    let (first, rest) = content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""));
    (parse_user_mention(first) == Some(bot)).then(|| (rest, true, format!("{first} ")))
}

/// Record and report the result of a stack run.
fn conclude(
    ctx: &ExecutionContext,
    run: Result<StackOutcome<CommandResult>, Box<dyn Any + Send>>,
) -> DispatchOutcome {
    let failure = match run {
        Ok(StackOutcome::Completed(Ok(()))) => return DispatchOutcome::Completed,
        Ok(StackOutcome::Rejected { gate, position }) => {
            metrics::record_gate_rejection(gate);
            debug!(gate, position, "Dispatch rejected");
            return DispatchOutcome::Rejected;
        }
        Ok(StackOutcome::Completed(Err(e))) => Failure::classify(e),
        Err(payload) => Failure::from_panic(payload.as_ref()),
    };

    let command = ctx.command();
    metrics::record_command_failure(command.category.key(), failure.class());
    let expiry = ctx.feedback().error();

    match failure {
        Failure::InsufficientExternalPermission(e) => {
            warn!(command = command.name, error = %e, "Platform refused a command action");
            ctx.error_expiring(ctx.translate_raw("errors.externalPermission", &[&e]), expiry);
            DispatchOutcome::ExternalPermission
        }
        Failure::InvalidArguments(reason) => {
            debug!(command = command.name, %reason, "Invalid arguments");
            let usage = command.usage.first().map_or(command.name, String::as_str);
            let usage = format!("{}{usage}", ctx.prefix());
            ctx.error_expiring(
                ctx.translate_raw("errors.invalidArguments", &[&reason, &usage]),
                expiry,
            );
            DispatchOutcome::InvalidArguments
        }
        Failure::Unexpected { class, detail } => {
            error!(
                command = command.name,
                category = %command.category,
                class,
                detail = %detail,
                content = %ctx.message().content,
                arguments = ?ctx.arguments(),
                "Command failed"
            );
            ctx.error_expiring(
                ctx.translate_raw("errors.unexpected", &[&command.name]),
                expiry,
            );
            DispatchOutcome::Failed
        }
    }
}
