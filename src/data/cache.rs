//! Expiring caches.
//!
//! [`TtlCache`] is an injected service rather than process-wide state: each
//! owner decides its lifetime and eviction schedule, and tests drive time
//! explicitly through the `*_at` methods.

use async_trait::async_trait;
use dashmap::DashMap;
use gatebot_model::{GuildId, UserId};
use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ConfigBundle, DataStore, StoreError};

/// A concurrent map whose entries expire a fixed time after insertion.
///
/// Expired entries are invisible to lookups immediately and are reclaimed
/// by [`sweep`](Self::sweep).
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    ttl: Duration,
    entries: DashMap<K, (V, Instant)>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        let (value, inserted) = entry.value();
        if now.saturating_duration_since(*inserted) < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (value, now));
    }

    #[cfg(test)]
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, (_, inserted)| now.saturating_duration_since(*inserted) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type BundleKey = (Option<GuildId>, UserId);

/// A [`DataStore`] that keeps fetched bundles for a while.
///
/// A zero TTL disables caching. Failures are never cached.
pub struct CachedStore<S> {
    inner: S,
    bundles: TtlCache<BundleKey, ConfigBundle>,
}

impl<S: DataStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            bundles: TtlCache::new(ttl),
        }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop a cached bundle.
    #[cfg(test)]
    pub fn invalidate(&self, guild: Option<GuildId>, user: UserId) {
        self.bundles.invalidate(&(guild, user));
    }

    /// Evict expired bundles.
    pub fn sweep(&self) -> usize {
        let removed = self.bundles.sweep();
        if removed > 0 {
            debug!(removed, remaining = self.bundles.len(), "Swept bundle cache");
        }
        removed
    }
}

#[async_trait]
impl<S: DataStore> DataStore for CachedStore<S> {
    async fn fetch_bundle(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<ConfigBundle, StoreError> {
        if self.bundles.ttl().is_zero() {
            return self.inner.fetch_bundle(guild, user).await;
        }
        let key = (guild, user);
        if let Some(bundle) = self.bundles.get(&key) {
            return Ok(bundle);
        }
        let bundle = self.inner.fetch_bundle(guild, user).await?;
        self.bundles.insert(key, bundle.clone());
        Ok(bundle)
    }

    async fn bot_admins(&self) -> Result<HashSet<UserId>, StoreError> {
        self.inner.bot_admins().await
    }
}
