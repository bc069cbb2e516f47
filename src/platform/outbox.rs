//! Outbound action queue.
//!
//! Feedback and replies are queued here and performed by a worker task, so
//! the dispatch that produced them never waits for network completion.
//! Auto-deletion is a detached timer per message, independent of the
//! dispatch's lifetime.

use gatebot_model::{ChannelId, OutboundMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use super::ChatClient;

/// One queued platform action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    Send {
        channel: ChannelId,
        message: OutboundMessage,
        /// Delete the posted message after this long.
        delete_after: Option<Duration>,
    },
}

/// Cloneable handle for queueing outbound actions.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboundAction>,
}

impl Outbox {
    /// Create an outbox and the receiver its worker drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a persistent message.
    pub fn send(&self, channel: ChannelId, message: OutboundMessage) {
        self.push(OutboundAction::Send {
            channel,
            message,
            delete_after: None,
        });
    }

    /// Queue a message that deletes itself after `after`.
    pub fn send_expiring(&self, channel: ChannelId, message: OutboundMessage, after: Duration) {
        self.push(OutboundAction::Send {
            channel,
            message,
            delete_after: Some(after),
        });
    }

    fn push(&self, action: OutboundAction) {
        if let Err(mpsc::error::SendError(action)) = self.tx.send(action) {
            warn!(?action, "Outbox worker gone, dropping action");
        }
    }
}

/// Spawn the worker that performs queued actions against `client`.
///
/// Each action runs on its own task. The worker finishes once every
/// [`Outbox`] handle is dropped and the in-flight sends completed; pending
/// auto-delete timers are detached and not awaited.
pub fn spawn_worker(
    mut rx: mpsc::UnboundedReceiver<OutboundAction>,
    client: Arc<dyn ChatClient>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        while let Some(action) = rx.recv().await {
            in_flight.spawn(perform(Arc::clone(&client), action));
            // Reap finished tasks so the set does not grow without bound.
            while in_flight.try_join_next().is_some() {}
        }
        while in_flight.join_next().await.is_some() {}
        debug!("Outbox worker stopped");
    })
}

async fn perform(client: Arc<dyn ChatClient>, action: OutboundAction) {
    match action {
        OutboundAction::Send {
            channel,
            message,
            delete_after,
        } => match client.send_message(channel, message).await {
            Ok(id) => {
                if let Some(after) = delete_after {
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        if let Err(e) = client.delete_message(channel, id).await {
                            debug!(%channel, message = %id, error = %e, "Auto-delete failed");
                        }
                    });
                }
            }
            Err(e) => warn!(%channel, error = %e, "Failed to send message"),
        },
    }
}
