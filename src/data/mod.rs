//! Data-access collaborator.
//!
//! The dispatcher fetches one [`ConfigBundle`] per dispatch and hands it to
//! the execution context as a read-only snapshot. Persistence updates are
//! the store's business; the pipeline never writes back.

pub mod cache;
pub mod memory;

use async_trait::async_trait;
use gatebot_model::{GuildId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub use cache::CachedStore;
pub use memory::MemoryStore;

/// Errors reported by a data store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "store_unavailable",
        }
    }
}

/// Per-guild settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSettings {
    /// Command prefix, if the guild overrides the default.
    pub prefix: Option<String>,
    /// Locale code, if the guild overrides the default.
    pub locale: Option<String>,
    pub moderator_roles: Vec<RoleId>,
    pub admin_roles: Vec<RoleId>,
    pub admin_users: Vec<UserId>,
    /// Alias trigger (lowercase) to `"<target trigger> <fixed args...>"`.
    pub aliases: HashMap<String, String>,
}

/// A user's progress in one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub user: UserId,
    pub guild: GuildId,
    pub experience: u64,
}

/// Whether a user linked an external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationState {
    pub user: UserId,
    pub verified: bool,
    pub linked_account: Option<String>,
}

/// Everything the pipeline needs to know about the caller's guild and user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBundle {
    pub guild: Option<GuildSettings>,
    pub player: Option<PlayerProfile>,
    pub verification: Option<VerificationState>,
}

/// Read access to guild and user configuration.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch the bundle for `user`, scoped to `guild` when the message came
    /// from one.
    async fn fetch_bundle(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<ConfigBundle, StoreError>;

    /// The global bot-admin allow-list.
    async fn bot_admins(&self) -> Result<HashSet<UserId>, StoreError>;
}
