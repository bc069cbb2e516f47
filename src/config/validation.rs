//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.bot_user_id must be a non-zero snowflake")]
    MissingBotUserId,
    #[error("bot.default_prefix must not be empty")]
    EmptyDefaultPrefix,
    #[error("bot.default_locale '{0}' has no language bundle")]
    UnknownDefaultLocale(String),
    #[error("bot.shard_total must be at least 1")]
    InvalidShardTotal,
    #[error("bot.shard_id {id} is out of range for {total} shards")]
    ShardOutOfRange { id: u32, total: u32 },
    #[error("throttle.sweep_interval_secs must be at least 1")]
    ZeroSweepInterval,
    #[error("guild {0} is configured more than once")]
    DuplicateGuild(u64),
    #[error("guild {0}: prefix must not be empty")]
    EmptyGuildPrefix(u64),
    #[error("guild {guild}: locale '{locale}' has no language bundle")]
    UnknownGuildLocale { guild: u64, locale: String },
    #[error("guild {guild}: alias '{alias}' has no target command")]
    EmptyAlias { guild: u64, alias: String },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let known_locale = |code: &str| crate::i18n::AVAILABLE.contains(&code);

    // Bot identity
    if config.bot.bot_user_id.get() == 0 {
        errors.push(ValidationError::MissingBotUserId);
    }
    if config.bot.default_prefix.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultPrefix);
    }
    if !known_locale(&config.bot.default_locale) {
        errors.push(ValidationError::UnknownDefaultLocale(
            config.bot.default_locale.clone(),
        ));
    }

    // Sharding
    if config.bot.shard_total == 0 {
        errors.push(ValidationError::InvalidShardTotal);
    } else if config.bot.shard_id >= config.bot.shard_total {
        errors.push(ValidationError::ShardOutOfRange {
            id: config.bot.shard_id,
            total: config.bot.shard_total,
        });
    }

    if config.throttle.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    // Guild seeds
    let mut seen = HashSet::new();
    for guild in &config.guilds {
        let id = guild.id.get();
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateGuild(id));
        }
        if let Some(prefix) = &guild.prefix
            && prefix.trim().is_empty()
        {
            errors.push(ValidationError::EmptyGuildPrefix(id));
        }
        if let Some(locale) = &guild.locale
            && !known_locale(locale)
        {
            errors.push(ValidationError::UnknownGuildLocale {
                guild: id,
                locale: locale.clone(),
            });
        }
        for (alias, target) in &guild.aliases {
            if target.trim().is_empty() {
                errors.push(ValidationError::EmptyAlias {
                    guild: id,
                    alias: alias.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
