use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatebot_model::{UserId, parse_user_mention};
use std::sync::Arc;

use crate::commands::{Category, CommandBody, CommandDescriptor, RegistryBuilder};
use crate::dispatch::ExecutionContext;
use crate::error::{CommandError, CommandResult, RegistryError};

pub(super) fn register(
    builder: &mut RegistryBuilder<'_>,
    started: DateTime<Utc>,
) -> Result<(), RegistryError> {
    builder
        .register(
            CommandDescriptor::new("uptime", Category::Utility)
                .description("How long the bot has been online")
                .usage("uptime"),
            Arc::new(Uptime { started }),
        )?
        .register(
            CommandDescriptor::new("channelid", Category::Utility)
                .alias("cid")
                .description("Show the id of this channel")
                .usage("channelid"),
            Arc::new(ChannelIdCommand),
        )?
        .register(
            CommandDescriptor::new("userid", Category::Utility)
                .alias("uid")
                .description("Show the id of a user")
                .usage("userid [@user | id]"),
            Arc::new(UserIdCommand),
        )?
        .register(
            CommandDescriptor::new("help", Category::Utility)
                .description("List commands or describe one")
                .usage("help [command]"),
            Arc::new(Help),
        )?;
    Ok(())
}

struct Uptime {
    started: DateTime<Utc>,
}

/// `3d 4h 5m 6s`, leaving out leading zero units.
fn format_duration(total_secs: i64) -> String {
    let total = total_secs.max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[async_trait]
impl CommandBody for Uptime {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let elapsed = Utc::now().signed_duration_since(self.started);
        let uptime = format_duration(elapsed.num_seconds());
        let since = self.started.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        ctx.info(ctx.translate("message", &[&uptime, &since]));
        Ok(())
    }
}

struct ChannelIdCommand;

#[async_trait]
impl CommandBody for ChannelIdCommand {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        ctx.info(ctx.translate("message", &[&ctx.channel().id]));
        Ok(())
    }
}

struct UserIdCommand;

#[async_trait]
impl CommandBody for UserIdCommand {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let (name, id) = if let Some(user) = ctx.mentioned_users().first() {
            (user.name.clone(), user.id)
        } else if let Some(raw) = ctx.arguments().first() {
            let id = parse_user_mention(raw)
                .or_else(|| raw.parse::<u64>().ok().map(UserId))
                .ok_or_else(|| CommandError::InvalidArguments(format!("`{raw}` is not a user")))?;
            (id.to_string(), id)
        } else {
            let author = ctx.author();
            let name = ctx
                .member()
                .map(|m| m.effective_name().to_string())
                .unwrap_or_else(|| author.name.clone());
            (name, author.id)
        };
        ctx.info(ctx.translate("message", &[&name, &id]));
        Ok(())
    }
}

/// Lists commands, or shows triggers, usage and gate requirements of one.
struct Help;

#[async_trait]
impl CommandBody for Help {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let registry = ctx.registry();
        let Some(query) = ctx.arguments().first() else {
            let names = registry
                .commands()
                .map(|c| format!("`{}`", c.name))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.info(ctx.translate("overview", &[&names, &ctx.prefix()]));
            return Ok(());
        };

        let Some(command) = registry.resolve(query) else {
            ctx.warning(ctx.translate("unknown", &[query]));
            return Ok(());
        };

        let prefix = ctx.prefix();
        let mut lines = vec![ctx.translate(
            "header",
            &[&command.name, &command.category, &command.description],
        )];
        lines.push(ctx.translate("triggers", &[&command.triggers.join(", ")]));
        if !command.usage.is_empty() {
            let usage = command
                .usage
                .iter()
                .map(|u| format!("`{prefix}{u}`"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(ctx.translate("usage", &[&usage]));
        }
        let gates = command
            .gates()
            .iter()
            .filter_map(|g| g.help_description())
            .map(|d| format!("- {d}"))
            .collect::<Vec<_>>();
        if !gates.is_empty() {
            lines.push(ctx.translate("gates", &[&gates.join("\n")]));
        }
        ctx.info(lines.join("\n"));
        Ok(())
    }
}
