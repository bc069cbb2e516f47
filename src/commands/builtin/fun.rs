use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::{Category, CommandBody, CommandDescriptor, RegistryBuilder};
use crate::dispatch::ExecutionContext;
use crate::error::{CommandError, CommandResult, RegistryError};

pub(super) fn register(builder: &mut RegistryBuilder<'_>) -> Result<(), RegistryError> {
    builder.register(
        CommandDescriptor::new("repeat", Category::Fun)
            .alias("echo")
            .description("Repeat a message")
            .usage("repeat <text>")
            .gate("throttle:user,2,5"),
        Arc::new(Repeat),
    )?;
    builder.register(
        CommandDescriptor::new("profile", Category::Fun)
            .alias("rank")
            .description("Show your experience and linked account")
            .usage("profile")
            .gate("guild-only")
            .gate("verified"),
        Arc::new(Profile),
    )?;
    Ok(())
}

struct Repeat;

#[async_trait]
impl CommandBody for Repeat {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let text = ctx.content_raw();
        if text.is_empty() {
            return Err(CommandError::InvalidArguments(ctx.translate("missing", &[])));
        }
        ctx.reply(text);
        Ok(())
    }
}

/// The caller's progress in the current guild.
struct Profile;

#[async_trait]
impl CommandBody for Profile {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let experience = ctx.player().map_or(0, |p| p.experience);
        let account = ctx
            .verification()
            .and_then(|v| v.linked_account.as_deref())
            .unwrap_or("-");
        let name = ctx
            .member()
            .map_or(ctx.author().name.as_str(), |m| m.effective_name());
        ctx.info(ctx.translate("message", &[&name, &experience, &account]));
        Ok(())
    }
}
