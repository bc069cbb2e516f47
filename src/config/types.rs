//! Core configuration types and loading.

use gatebot_model::{GuildId, RoleId, UserId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and defaults.
    pub bot: BotConfig,
    /// Lifetimes of auto-deleted feedback messages.
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// Throttle bucket maintenance.
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Configuration bundle caching.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Global permission overrides.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Guild settings seeded into the in-memory store.
    #[serde(default)]
    pub guilds: Vec<GuildSeed>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// Account id of the bot user, used to recognise mention invocations.
    pub bot_user_id: UserId,
    /// Prefix for guilds without their own.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
    /// Locale for guilds without their own, and the fallback for missing keys.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Shard this process serves.
    #[serde(default)]
    pub shard_id: u32,
    /// Total number of shards.
    #[serde(default = "default_shard_total")]
    pub shard_total: u32,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    pub metrics_port: Option<u16>,
}

/// How long feedback messages stay up before they are deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    /// Plain-text warning about the missing embed capability.
    #[serde(default = "default_capability_warning_secs")]
    pub capability_warning_secs: u64,
    /// Permission and failure errors.
    #[serde(default = "default_error_secs")]
    pub error_secs: u64,
    /// Guild restriction notices.
    #[serde(default = "default_restriction_secs")]
    pub restriction_secs: u64,
    /// Throttle notices.
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
}

impl FeedbackConfig {
    pub fn capability_warning(&self) -> Duration {
        Duration::from_secs(self.capability_warning_secs)
    }

    pub fn error(&self) -> Duration {
        Duration::from_secs(self.error_secs)
    }

    pub fn restriction(&self) -> Duration {
        Duration::from_secs(self.restriction_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            capability_warning_secs: default_capability_warning_secs(),
            error_secs: default_error_secs(),
            restriction_secs: default_restriction_secs(),
            throttle_secs: default_throttle_secs(),
        }
    }
}

/// Throttle bucket maintenance.
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// How often expired buckets are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Configuration bundle cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds a fetched bundle stays valid (0 disables caching).
    #[serde(default = "default_bundle_ttl_secs")]
    pub bundle_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bundle_ttl_secs: default_bundle_ttl_secs(),
        }
    }
}

/// Global permission overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsConfig {
    /// Users granted the bot-admin level everywhere.
    #[serde(default)]
    pub bot_admins: Vec<UserId>,
    /// Guilds allowed through the `official-guild` gate.
    #[serde(default)]
    pub official_guilds: Vec<GuildId>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// One `[[guilds]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildSeed {
    pub id: GuildId,
    pub prefix: Option<String>,
    pub locale: Option<String>,
    #[serde(default)]
    pub moderator_roles: Vec<RoleId>,
    #[serde(default)]
    pub admin_roles: Vec<RoleId>,
    #[serde(default)]
    pub admin_users: Vec<UserId>,
    /// Alias trigger to `"<target trigger> <fixed args...>"`.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub players: Vec<PlayerSeed>,
}

/// Per-user data seeded for a guild.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSeed {
    pub user: UserId,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub verified: bool,
    pub linked_account: Option<String>,
}
