//! `require:<user|bot>,<capability>...` gates.
//!
//! Both variants let direct messages through: there are no channel
//! permissions to check outside a guild.

use async_trait::async_trait;
use gatebot_model::Capabilities;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{Flow, Middleware};
use crate::dispatch::ExecutionContext;
use crate::error::GateSpecError;

/// Whose capabilities a [`RequireMiddleware`] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireTarget {
    /// The invoking member. Bot admins are exempt.
    User,
    /// The bot itself, in the invoking channel.
    Bot,
}

impl FromStr for RequireTarget {
    type Err = GateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            _ => Err(GateSpecError::InvalidRequireTarget(s.trim().to_string())),
        }
    }
}

/// `require:user,...` and `require:bot,...`.
///
/// Direct messages always pass, for both targets: capabilities are a guild
/// channel concept and a private channel grants the bot everything it needs
/// to answer. This is a deliberate choice of this gate, not platform behavior.
#[derive(Debug)]
pub struct RequireMiddleware {
    target: RequireTarget,
    capabilities: Capabilities,
}

impl RequireMiddleware {
    pub fn new(target: RequireTarget, capabilities: Capabilities) -> Self {
        Self {
            target,
            capabilities,
        }
    }

    fn reject(&self, ctx: &ExecutionContext, missing: Capabilities) -> Flow {
        let key = match self.target {
            RequireTarget::User => "errors.missingUserCapability",
            RequireTarget::Bot => "errors.missingBotCapability",
        };
        debug!(gate = self.name(), %missing, "missing capabilities");
        let list = missing
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.error_expiring(ctx.translate_raw(key, &[&list]), ctx.feedback().error());
        Flow::Halt
    }
}

#[async_trait]
impl Middleware for RequireMiddleware {
    fn name(&self) -> &'static str {
        match self.target {
            RequireTarget::User => "require:user",
            RequireTarget::Bot => "require:bot",
        }
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        if !ctx.is_guild_message() {
            return Flow::Continue;
        }

        let held = match self.target {
            RequireTarget::User => {
                if ctx.is_bot_admin() {
                    return Flow::Continue;
                }
                ctx.member()
                    .map(|m| m.capabilities)
                    .unwrap_or_default()
            }
            RequireTarget::Bot => match ctx.client().self_capabilities(ctx.channel().id).await {
                Ok(caps) => caps,
                Err(e) => {
                    warn!(channel = %ctx.channel().id, error = %e, "Could not read bot capabilities");
                    return Flow::Halt;
                }
            },
        };

        let missing = held.missing(self.capabilities);
        if missing.is_empty() {
            Flow::Continue
        } else {
            self.reject(ctx, missing)
        }
    }

    fn help_description(&self) -> Option<String> {
        let who = match self.target {
            RequireTarget::User => "You need",
            RequireTarget::Bot => "The bot needs",
        };
        Some(format!("{who}: {}", self.capabilities))
    }
}
