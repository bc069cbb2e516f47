//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_bot_name() -> String {
    "gatebot".to_string()
}

pub fn default_prefix() -> String {
    "!".to_string()
}

pub fn default_locale() -> String {
    "en_US".to_string()
}

pub fn default_shard_total() -> u32 {
    1
}

// =============================================================================
// Feedback Defaults
// =============================================================================

pub fn default_capability_warning_secs() -> u64 {
    30
}

pub fn default_error_secs() -> u64 {
    30
}

pub fn default_restriction_secs() -> u64 {
    45
}

pub fn default_throttle_secs() -> u64 {
    10
}

// =============================================================================
// Maintenance Defaults
// =============================================================================

pub fn default_sweep_interval_secs() -> u64 {
    60
}

pub fn default_bundle_ttl_secs() -> u64 {
    300
}

pub fn default_log_level() -> String {
    "info".to_string()
}
