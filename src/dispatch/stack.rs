//! Ordered gate execution.

use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::ExecutionContext;
use crate::middleware::{Flow, Middleware};

/// Result of driving a [`MiddlewareStack`].
#[derive(Debug, PartialEq, Eq)]
pub enum StackOutcome<T> {
    /// Gate `gate` at 1-indexed `position` halted the dispatch.
    Rejected {
        gate: &'static str,
        position: usize,
    },
    /// Every gate passed and the terminal returned `T`.
    Completed(T),
}

/// A cursor over one command's gates, consumed by a single dispatch.
pub struct MiddlewareStack<'a> {
    gates: &'a [Arc<dyn Middleware>],
    cursor: usize,
}

impl<'a> MiddlewareStack<'a> {
    pub fn new(gates: &'a [Arc<dyn Middleware>]) -> Self {
        Self { gates, cursor: 0 }
    }

    /// Run the gates in order, then `terminal` if none halted.
    pub async fn run<F, Fut, T>(mut self, ctx: &ExecutionContext, terminal: F) -> StackOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        while let Some(gate) = self.gates.get(self.cursor) {
            self.cursor += 1;
            match gate.handle(ctx).await {
                Flow::Continue => {
                    debug!(gate = gate.name(), position = self.cursor, "gate passed");
                }
                Flow::Halt => {
                    debug!(gate = gate.name(), position = self.cursor, "gate halted dispatch");
                    return StackOutcome::Rejected {
                        gate: gate.name(),
                        position: self.cursor,
                    };
                }
            }
        }
        StackOutcome::Completed(terminal().await)
    }
}
