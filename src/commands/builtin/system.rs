use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::{Category, CommandBody, CommandDescriptor, RegistryBuilder};
use crate::dispatch::ExecutionContext;
use crate::error::{CommandResult, RegistryError};

pub(super) fn register(builder: &mut RegistryBuilder<'_>) -> Result<(), RegistryError> {
    builder.register(
        CommandDescriptor::new("stats", Category::System)
            .description("Command usage since startup")
            .usage("stats")
            .gate("permission:bot-admin"),
        Arc::new(Stats),
    )?;
    Ok(())
}

/// Per-command usage counts, most used first.
struct Stats;

#[async_trait]
impl CommandBody for Stats {
    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let stats = ctx.registry().command_stats();
        if stats.is_empty() {
            ctx.info(ctx.translate("empty", &[]));
            return Ok(());
        }

        let mut lines = vec![ctx.translate("header", &[])];
        lines.extend(
            stats
                .iter()
                .map(|(name, count)| ctx.translate("entry", &[name, count])),
        );
        ctx.info(lines.join("\n"));
        Ok(())
    }
}
