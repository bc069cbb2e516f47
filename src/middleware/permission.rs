//! `permission:<level>` gate.

use async_trait::async_trait;
use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatch::ExecutionContext;
use crate::security::PermissionLevel;

/// Rejects callers whose resolved level is below `required`.
#[derive(Debug)]
pub struct PermissionMiddleware {
    required: PermissionLevel,
}

impl PermissionMiddleware {
    pub fn new(required: PermissionLevel) -> Self {
        Self { required }
    }
}

#[async_trait]
impl Middleware for PermissionMiddleware {
    fn name(&self) -> &'static str {
        "permission"
    }

    async fn handle(&self, ctx: &ExecutionContext) -> Flow {
        let level = ctx.permission_level();
        if level >= self.required {
            return Flow::Continue;
        }

        debug!(
            author = %ctx.author().id,
            %level,
            required = %self.required,
            "permission level too low"
        );
        let level_name = ctx.translate_raw(self.required.i18n_key(), &[]);
        let text = ctx.translate_raw("errors.missingPermissionLevel", &[&level_name]);
        ctx.error_expiring(text, ctx.feedback().error());
        Flow::Halt
    }

    fn help_description(&self) -> Option<String> {
        match self.required {
            PermissionLevel::Default => None,
            level => Some(format!("Permission level: {level}")),
        }
    }
}
