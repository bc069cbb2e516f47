//! Guild restriction gates: `official-guild` and `guild-only`.

use async_trait::async_trait;
use gatebot_model::GuildId;
use std::collections::HashSet;
use std::sync::Arc;

use super::{Flow, Middleware};
use crate::dispatch::ExecutionContext;

/// Only lets guilds on the configured allow-list through.
///
/// Direct messages and bot admins always pass.
#[derive(Debug)]
pub struct OfficialGuildMiddleware {
    official: Arc<HashSet<GuildId>>,
}

impl OfficialGuildMiddleware {
    pub fn new(official: Arc<HashSet<GuildId>>) -> Self {
        Self { official }
    }
}

#[async_trait]
impl Middleware for OfficialGuildMiddleware {
    fn name(&self) -> &'static str {
        "official-guild"
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        let Some(guild) = ctx.guild() else {
            return Flow::Continue;
        };
        if ctx.is_bot_admin() || self.official.contains(&guild.id) {
            return Flow::Continue;
        }
        let text = ctx.translate_raw("errors.notOfficialGuild", &[]);
        ctx.error_expiring(text, ctx.feedback().restriction());
        Flow::Halt
    }

    fn help_description(&self) -> Option<String> {
        Some("Only available in official guilds".to_string())
    }
}

/// Rejects direct messages.
#[derive(Debug)]
pub struct GuildOnlyMiddleware;

#[async_trait]
impl Middleware for GuildOnlyMiddleware {
    fn name(&self) -> &'static str {
        "guild-only"
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        if ctx.is_guild_message() {
            return Flow::Continue;
        }
        let text = ctx.translate_raw("errors.guildOnly", &[]);
        ctx.error_expiring(text, ctx.feedback().restriction());
        Flow::Halt
    }

    fn help_description(&self) -> Option<String> {
        Some("Only available in servers".to_string())
    }
}
