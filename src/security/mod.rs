//! Security module for gatebot.
//!
//! Provides the shared state behind the access gates:
//! - **Permissions**: caller privilege levels from guild settings, roles and capabilities
//! - **Throttling**: fixed-window per-scope command limits
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Security Module                │
//! ├──────────────────────┬───────────────────────┤
//! │  PermissionResolver  │     ThrottleGate      │
//! │  pure, per dispatch  │  DashMap buckets      │
//! │  Default..BotAdmin   │  user/channel/guild/  │
//! │                      │  global scopes        │
//! └──────────────────────┴───────────────────────┘
//! ```

pub mod permissions;
pub mod throttle;

// Re-export primary types for convenience
pub use permissions::{PermissionLevel, PermissionResolver};
pub use throttle::{ThrottleDecision, ThrottleGate, ThrottleScope};
