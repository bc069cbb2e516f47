//! gatebot - command dispatch pipeline for a chat platform bot.
//!
//! Inbound message events are read as JSON lines from stdin, platform
//! actions are written as JSON lines to stdout and logs go to stderr.

mod commands;
mod config;
mod data;
mod dispatch;
mod error;
mod http;
mod i18n;
mod metrics;
mod middleware;
mod platform;
mod security;
mod telemetry;

use crate::commands::{CommandRegistry, builtin};
use crate::config::Config;
use crate::data::{CachedStore, DataStore, MemoryStore};
use crate::dispatch::{DispatchSettings, Dispatcher, Services};
use crate::i18n::Languages;
use crate::middleware::MiddlewareFactory;
use crate::platform::console::{self, ConsoleClient};
use crate::platform::{ChatClient, Outbox, outbox};
use crate::security::{PermissionResolver, ThrottleGate};
use gatebot_model::User;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = chrono::Utc::now();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("Failed to load config {config_path}: {e}");
        e
    })?;

    telemetry::init_logging(&config.logging);

    if let Err(problems) = crate::config::validation::validate(&config) {
        for problem in &problems {
            error!(path = %config_path, "{problem}");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s). See error messages above.",
            problems.len()
        ));
    }

    info!(
        bot = %config.bot.name,
        user_id = %config.bot.bot_user_id,
        shard = config.bot.shard_id,
        shards = config.bot.shard_total,
        "Starting gatebot"
    );

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.bot.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let languages = Arc::new(Languages::embedded(&config.bot.default_locale)?);

    let store = Arc::new(CachedStore::new(
        MemoryStore::from_config(&config),
        Duration::from_secs(config.cache.bundle_ttl_secs),
    ));
    let bot_admins = store.bot_admins().await?;
    info!(count = bot_admins.len(), "Loaded bot admins");
    let permissions = Arc::new(PermissionResolver::new(bot_admins));

    let throttle = Arc::new(ThrottleGate::new());

    // Start throttle bucket and bundle cache sweeping task
    {
        let throttle = Arc::clone(&throttle);
        let store = Arc::clone(&store);
        let period = Duration::from_secs(config.throttle.sweep_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let buckets = throttle.sweep();
                let bundles = store.sweep();
                if buckets > 0 || bundles > 0 {
                    info!(buckets, bundles, "Expired throttle buckets and cached bundles removed");
                }
            }
        });
    }
    info!("Sweep task started");

    let bot = User {
        id: config.bot.bot_user_id,
        name: config.bot.name.clone(),
        bot: true,
    };
    let client = Arc::new(ConsoleClient::stdout(bot));
    let (outbox, outbound) = Outbox::channel();
    let worker = outbox::spawn_worker(outbound, Arc::clone(&client) as Arc<dyn ChatClient>);

    // Create command registry
    let mut factory = MiddlewareFactory::new(
        Arc::clone(&throttle),
        config.permissions.official_guilds.iter().copied().collect(),
    );
    builtin::register_gates(&mut factory);
    let mut builder = CommandRegistry::builder(&factory);
    builtin::register_all(&mut builder, started)?;
    let registry = Arc::new(builder.build());
    anyhow::ensure!(!registry.is_empty(), "No commands registered");
    info!(commands = registry.len(), "Command registry built");

    let services = Arc::new(Services {
        client: Arc::clone(&client) as Arc<dyn ChatClient>,
        store: store as Arc<dyn DataStore>,
        languages,
        permissions,
        outbox,
        settings: DispatchSettings::from_config(&config, &client.bot_user()),
    });
    let dispatcher = Arc::new(Dispatcher::new(services, registry));

    info!("Reading events from stdin");
    let input = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = console::run(input, Arc::clone(&client), Arc::clone(&dispatcher)) => {
            result?;
            info!("End of input");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    // Dropping the last outbox handle lets the worker finish queued sends.
    drop(dispatcher);
    if let Err(e) = worker.await {
        error!(error = %e, "Outbox worker failed");
    }

    info!("Shutdown complete");
    Ok(())
}
