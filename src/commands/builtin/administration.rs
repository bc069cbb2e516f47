use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::commands::{Category, CommandBody, CommandDescriptor, RegistryBuilder};
use crate::dispatch::ExecutionContext;
use crate::error::{CommandError, CommandResult, RegistryError};

/// Most messages one purge may delete.
pub const PURGE_LIMIT: usize = 100;

pub(super) fn register(builder: &mut RegistryBuilder<'_>) -> Result<(), RegistryError> {
    builder.register(
        CommandDescriptor::new("purge", Category::Administration)
            .alias("clear")
            .description("Delete recent messages in this channel")
            .usage("purge <amount>")
            .gate("guild-only")
            .gate("require:user,text.manage_messages")
            .gate("require:bot,text.manage_messages,text.read_message_history")
            .gate("throttle:channel,1,5"),
        Arc::new(Purge),
    )?;
    Ok(())
}

struct Purge;

#[async_trait]
impl CommandBody for Purge {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let amount = ctx
            .arguments()
            .first()
            .and_then(|a| a.parse::<usize>().ok())
            .filter(|n| (1..=PURGE_LIMIT).contains(n))
            .ok_or_else(|| {
                CommandError::InvalidArguments(ctx.translate("invalidAmount", &[&PURGE_LIMIT]))
            })?;

        let channel = ctx.channel().id;
        let invoking = ctx.message().id;
        // One extra for the invoking message, which goes too.
        let history = ctx.client().message_history(channel, amount + 1).await?;
        for id in &history {
            ctx.client().delete_message(channel, *id).await?;
        }

        let deleted = history.iter().filter(|id| **id != invoking).count();
        debug!(%channel, deleted, "Purged messages");
        ctx.success_expiring(ctx.translate("deleted", &[&deleted]), ctx.feedback().error());
        Ok(())
    }
}
