//! Telemetry utilities: log subscriber setup, command timing and dispatch spans.

use std::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to
/// stderr so stdout stays free for the platform adapter.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped, so early returns and panics are
/// timed too.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use gatebot_model::InboundMessage;
    use tracing::{Span, info_span};
    use uuid::Uuid;

    /// Create the span that correlates every log line of one dispatch.
    ///
    /// Guild is empty for direct messages.
    pub fn dispatch(message: &InboundMessage) -> Span {
        let guild = message
            .guild
            .as_ref()
            .map(|g| g.id.to_string())
            .unwrap_or_default();
        info_span!(
            "dispatch",
            dispatch_id = %Uuid::new_v4(),
            guild = %guild,
            shard = %message.shard,
            channel = %message.channel.id,
            author = %message.author.id,
            message = %message.id,
        )
    }
}
