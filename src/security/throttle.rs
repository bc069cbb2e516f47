//! Fixed-window command throttling.
//!
//! One bucket per `(scope, scope id, command, limit, window)`, so two
//! throttles declared on one command count independently. A bucket's window
//! opens at the first call admitted into it and lasts `window`; the first
//! call after that opens a new window. Calls beyond the limit are denied and do not
//! count, so a caller hammering a throttled command cannot extend their own
//! lockout.
//!
//! # Concurrency
//!
//! Buckets live in a [`DashMap`]. Each increment-and-check runs while holding
//! the entry's shard write lock, so concurrent acquisitions for one key are
//! applied in some sequential order and none is lost.

use dashmap::DashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::GateSpecError;

/// What a throttle counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleScope {
    User,
    Channel,
    Guild,
    Global,
}

impl ThrottleScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Guild => "guild",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for ThrottleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThrottleScope {
    type Err = GateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "channel" => Ok(Self::Channel),
            "guild" => Ok(Self::Guild),
            "global" => Ok(Self::Global),
            other => Err(GateSpecError::InvalidThrottleScope(other.to_string())),
        }
    }
}

/// Identifies one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub scope: ThrottleScope,
    pub scope_id: u64,
    pub command: Arc<str>,
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug)]
struct Bucket {
    count: u32,
    window_start: Instant,
    window: Duration,
    notified: bool,
}

impl Bucket {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }
}

/// Result of one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed {
        /// Calls left in the current window.
        remaining: u32,
    },
    Denied {
        /// Time until the window resets.
        retry_after: Duration,
        /// Whether this is the first denial of the window.
        first_rejection: bool,
    },
}

impl ThrottleDecision {
    #[cfg(test)]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Shared throttle state for every command.
#[derive(Debug, Default)]
pub struct ThrottleGate {
    buckets: DashMap<ThrottleKey, Bucket>,
}

impl ThrottleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a call at `now` is allowed.
    #[cfg(test)]
    pub fn try_acquire_at(
        &self,
        scope: ThrottleScope,
        scope_id: u64,
        command: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> bool {
        self.acquire_at(scope, scope_id, command, limit, window, now)
            .is_allowed()
    }

    pub fn acquire(
        &self,
        scope: ThrottleScope,
        scope_id: u64,
        command: &str,
        limit: u32,
        window: Duration,
    ) -> ThrottleDecision {
        self.acquire_at(scope, scope_id, command, limit, window, Instant::now())
    }

    pub fn acquire_at(
        &self,
        scope: ThrottleScope,
        scope_id: u64,
        command: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> ThrottleDecision {
        let key = ThrottleKey {
            scope,
            scope_id,
            command: Arc::from(command),
            limit,
            window,
        };
        let mut bucket = self.buckets.entry(key).or_insert_with(|| Bucket {
            count: 0,
            window_start: now,
            window,
            notified: false,
        });

        if bucket.expired(now) {
            bucket.count = 0;
            bucket.window_start = now;
            bucket.notified = false;
        }

        if bucket.count < limit {
            bucket.count += 1;
            return ThrottleDecision::Allowed {
                remaining: limit - bucket.count,
            };
        }

        let first_rejection = !bucket.notified;
        bucket.notified = true;
        let retry_after = (bucket.window_start + bucket.window).saturating_duration_since(now);
        debug!(
            %scope, scope_id, command, limit,
            retry_after_ms = retry_after.as_millis() as u64,
            "throttle limit exceeded"
        );
        ThrottleDecision::Denied {
            retry_after,
            first_rejection,
        }
    }

    /// Drop buckets whose window has elapsed.
    ///
    /// Call periodically from a maintenance task.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.expired(now));
        let remaining = self.buckets.len();
        crate::metrics::set_throttle_buckets(remaining);
        before.saturating_sub(remaining)
    }

    /// Number of live buckets.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
