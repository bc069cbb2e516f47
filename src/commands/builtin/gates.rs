//! Gates contributed by the built-in command set.

use async_trait::async_trait;
use std::sync::Arc;

use crate::dispatch::ExecutionContext;
use crate::error::GateSpecError;
use crate::middleware::{Flow, Middleware, MiddlewareFactory};

/// Make the built-in custom gates available to gate specifications.
pub fn register_gates(factory: &mut MiddlewareFactory) {
    factory.register_custom("verified", |args: &[String]| {
        if !args.is_empty() {
            return Err(GateSpecError::UnexpectedArguments("verified".to_string()));
        }
        Ok(Arc::new(VerifiedMiddleware) as Arc<dyn Middleware>)
    });
}

/// `verified`: the caller must have linked an external account. Bot admins
/// pass.
#[derive(Debug)]
pub struct VerifiedMiddleware;

#[async_trait]
impl Middleware for VerifiedMiddleware {
    fn name(&self) -> &'static str {
        "verified"
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        if ctx.is_bot_admin() || ctx.verification().is_some_and(|v| v.verified) {
            return Flow::Continue;
        }
        ctx.error_expiring(
            ctx.translate_raw("errors.notVerified", &[]),
            ctx.feedback().restriction(),
        );
        Flow::Halt
    }

    fn help_description(&self) -> Option<String> {
        Some("Requires a linked account".to_string())
    }
}
