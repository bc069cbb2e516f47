//! `throttle:<scope>,<limit>,<seconds>` gate.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Flow, Middleware};
use crate::dispatch::ExecutionContext;
use crate::security::{ThrottleDecision, ThrottleGate, ThrottleScope};

#[derive(Debug)]
pub struct ThrottleMiddleware {
    gate: Arc<ThrottleGate>,
    scope: ThrottleScope,
    limit: u32,
    window: Duration,
}

impl ThrottleMiddleware {
    pub fn new(gate: Arc<ThrottleGate>, scope: ThrottleScope, limit: u32, window: Duration) -> Self {
        Self {
            gate,
            scope,
            limit,
            window,
        }
    }

    /// Bucket id for the dispatch. Guild scope falls back to the channel in
    /// direct messages; global scope shares one bucket.
    fn scope_id(&self, ctx: &ExecutionContext) -> u64 {
        match self.scope {
            ThrottleScope::User => ctx.author().id.get(),
            ThrottleScope::Channel => ctx.channel().id.get(),
            ThrottleScope::Guild => ctx
                .guild()
                .map(|g| g.id.get())
                .unwrap_or_else(|| ctx.channel().id.get()),
            ThrottleScope::Global => 0,
        }
    }
}

#[async_trait]
impl Middleware for ThrottleMiddleware {
    fn name(&self) -> &'static str {
        "throttle"
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        let decision = self.gate.acquire(
            self.scope,
            self.scope_id(ctx),
            ctx.command().name,
            self.limit,
            self.window,
        );
        match decision {
            ThrottleDecision::Allowed { .. } => Flow::Continue,
            ThrottleDecision::Denied {
                retry_after,
                first_rejection,
            } => {
                if first_rejection {
                    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                    let text = ctx.translate_raw("errors.tooManyAttempts", &[&secs.max(1)]);
                    ctx.error_expiring(text, ctx.feedback().throttle());
                }
                Flow::Halt
            }
        }
    }

    fn help_description(&self) -> Option<String> {
        Some(format!(
            "Limited to {} use(s) per {} second(s) per {}",
            self.limit,
            self.window.as_secs(),
            self.scope
        ))
    }
}
