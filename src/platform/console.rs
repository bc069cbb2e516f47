//! Console platform adapter.
//!
//! Reads inbound events as JSON lines (one [`ConsoleEvent`] per line) and
//! writes every platform action the bot performs as a JSON line
//! ([`ConsoleAction`]). The adapter keeps just enough channel state to answer
//! capability and history queries the way a live gateway would.

use async_trait::async_trait;
use dashmap::DashMap;
use gatebot_model::{
    Capabilities, Capability, ChannelId, InboundMessage, MessageId, OutboundMessage, Tone, User,
    UserId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncBufReadExt;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{ChatClient, PlatformError};
use crate::dispatch::Dispatcher;

/// Messages remembered per channel for history queries.
const HISTORY_DEPTH: usize = 200;

/// First id handed out to messages the bot posts.
const FIRST_OUTBOUND_ID: u64 = 1 << 48;

/// One inbound line.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleEvent {
    pub message: InboundMessage,
    /// The bot's capabilities in the message's channel, if they changed.
    #[serde(default)]
    pub bot_capabilities: Option<Capabilities>,
}

/// One outbound line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConsoleAction {
    Send {
        channel: ChannelId,
        message_id: MessageId,
        content: String,
        tone: Tone,
    },
    Delete {
        channel: ChannelId,
        message_id: MessageId,
    },
}

#[derive(Debug)]
struct ChannelState {
    capabilities: Capabilities,
    /// `(message, author)`, newest at the back.
    history: VecDeque<(MessageId, UserId)>,
}

impl ChannelState {
    fn new() -> Self {
        Self {
            capabilities: Capabilities::all(),
            history: VecDeque::new(),
        }
    }

    fn remember(&mut self, message: MessageId, author: UserId) {
        if self.history.len() == HISTORY_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back((message, author));
    }
}

/// [`ChatClient`] that writes actions as JSON lines.
pub struct ConsoleClient {
    bot: User,
    channels: DashMap<ChannelId, ChannelState>,
    next_id: AtomicU64,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleClient {
    pub fn new(bot: User, out: Box<dyn Write + Send>) -> Self {
        Self {
            bot,
            channels: DashMap::new(),
            next_id: AtomicU64::new(FIRST_OUTBOUND_ID),
            out: Mutex::new(out),
        }
    }

    /// Client writing to stdout.
    pub fn stdout(bot: User) -> Self {
        Self::new(bot, Box::new(std::io::stdout()))
    }

    /// Record channel state carried by an event and return its message.
    pub fn observe(&self, event: ConsoleEvent) -> Arc<InboundMessage> {
        let message = event.message;
        let mut state = self
            .channels
            .entry(message.channel.id)
            .or_insert_with(ChannelState::new);
        if let Some(caps) = event.bot_capabilities {
            state.capabilities = caps;
        }
        state.remember(message.id, message.author.id);
        drop(state);
        Arc::new(message)
    }

    fn capabilities(&self, channel: ChannelId) -> Capabilities {
        self.channels
            .get(&channel)
            .map(|s| s.capabilities)
            .unwrap_or_else(Capabilities::all)
    }

    fn emit(&self, action: &ConsoleAction) -> Result<(), PlatformError> {
        let line =
            serde_json::to_string(action).map_err(|e| PlatformError::Unavailable(e.to_string()))?;
        let mut out = self.out.lock();
        writeln!(out, "{line}")
            .and_then(|_| out.flush())
            .map_err(|e| PlatformError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn bot_user(&self) -> User {
        self.bot.clone()
    }

    async fn self_capabilities(&self, channel: ChannelId) -> Result<Capabilities, PlatformError> {
        Ok(self.capabilities(channel))
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, PlatformError> {
        let caps = self.capabilities(channel);
        if !caps.allows(Capability::SendMessages) {
            return Err(PlatformError::MissingCapability(Capability::SendMessages));
        }
        if message.tone.is_embed() && !caps.allows(Capability::EmbedLinks) {
            return Err(PlatformError::MissingCapability(Capability::EmbedLinks));
        }

        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.emit(&ConsoleAction::Send {
            channel,
            message_id: id,
            content: message.content,
            tone: message.tone,
        })?;
        self.channels
            .entry(channel)
            .or_insert_with(ChannelState::new)
            .remember(id, self.bot.id);
        Ok(id)
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        {
            let mut state = self
                .channels
                .get_mut(&channel)
                .ok_or(PlatformError::UnknownMessage(message))?;
            let pos = state
                .history
                .iter()
                .position(|(id, _)| *id == message)
                .ok_or(PlatformError::UnknownMessage(message))?;
            let (_, author) = state.history[pos];
            if author != self.bot.id && !state.capabilities.allows(Capability::ManageMessages) {
                return Err(PlatformError::MissingCapability(Capability::ManageMessages));
            }
            state.history.remove(pos);
        }
        self.emit(&ConsoleAction::Delete {
            channel,
            message_id: message,
        })
    }

    async fn message_history(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError> {
        let Some(state) = self.channels.get(&channel) else {
            return Ok(Vec::new());
        };
        if !state.capabilities.allows(Capability::ReadMessageHistory) {
            return Err(PlatformError::MissingCapability(
                Capability::ReadMessageHistory,
            ));
        }
        Ok(state
            .history
            .iter()
            .rev()
            .take(limit)
            .map(|(id, _)| *id)
            .collect())
    }
}

/// Feed every line of `reader` to the dispatcher until end of input.
///
/// Each event is dispatched on its own task; the call returns once all of
/// them finished.
pub async fn run<R>(
    reader: R,
    client: Arc<ConsoleClient>,
    dispatcher: Arc<Dispatcher>,
) -> std::io::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = match serde_json::from_str::<ConsoleEvent>(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed console event");
                continue;
            }
        };
        let message = client.observe(event);
        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            let handled = dispatcher.dispatch(message).await;
            debug!(handled, "Console event processed");
        });
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}
