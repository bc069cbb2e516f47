//! In-memory data store seeded from configuration.

use async_trait::async_trait;
use dashmap::DashMap;
use gatebot_model::{GuildId, UserId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{ConfigBundle, DataStore, GuildSettings, PlayerProfile, StoreError, VerificationState};
use crate::config::Config;

#[derive(Debug, Default)]
pub struct MemoryStore {
    guilds: DashMap<GuildId, GuildSettings>,
    players: DashMap<(GuildId, UserId), PlayerProfile>,
    verification: DashMap<UserId, VerificationState>,
    bot_admins: HashSet<UserId>,
    unavailable: AtomicBool,
    fetches: AtomicU64,
}

impl MemoryStore {
    pub fn new(bot_admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            bot_admins: bot_admins.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Store holding the `[permissions]` allow-list and every `[[guilds]]` seed.
    pub fn from_config(config: &Config) -> Self {
        let store = Self::new(config.permissions.bot_admins.iter().copied());
        for seed in &config.guilds {
            store.insert_guild(
                seed.id,
                GuildSettings {
                    prefix: seed.prefix.clone(),
                    locale: seed.locale.clone(),
                    moderator_roles: seed.moderator_roles.clone(),
                    admin_roles: seed.admin_roles.clone(),
                    admin_users: seed.admin_users.clone(),
                    aliases: seed.aliases.clone(),
                },
            );
            for player in &seed.players {
                store.insert_player(PlayerProfile {
                    user: player.user,
                    guild: seed.id,
                    experience: player.experience,
                });
                store.insert_verification(VerificationState {
                    user: player.user,
                    verified: player.verified,
                    linked_account: player.linked_account.clone(),
                });
            }
        }
        store
    }

    /// Insert or replace a guild's settings. Alias triggers are lowercased.
    pub fn insert_guild(&self, guild: GuildId, mut settings: GuildSettings) {
        settings.aliases = settings
            .aliases
            .into_iter()
            .map(|(alias, target)| (alias.to_lowercase(), target))
            .collect();
        self.guilds.insert(guild, settings);
    }

    pub fn insert_player(&self, profile: PlayerProfile) {
        self.players.insert((profile.guild, profile.user), profile);
    }

    pub fn insert_verification(&self, state: VerificationState) {
        self.verification.insert(state.user, state);
    }

    /// Make every fetch fail, as a stand-in for a lost database connection.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of bundle fetches served.
    #[cfg(test)]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch_bundle(
        &self,
        guild: Option<GuildId>,
        user: UserId,
    ) -> Result<ConfigBundle, StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let settings = guild.and_then(|g| self.guilds.get(&g).map(|s| s.clone()));
        let player = guild.and_then(|g| self.players.get(&(g, user)).map(|p| p.clone()));
        let verification = self.verification.get(&user).map(|v| v.clone());
        Ok(ConfigBundle {
            guild: settings,
            player,
            verification,
        })
    }

    async fn bot_admins(&self) -> Result<HashSet<UserId>, StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(self.bot_admins.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        toml::from_str(
            r#"
[bot]
bot_user_id = 100

[permissions]
bot_admins = [1]

[[guilds]]
id = 10
prefix = "?"
aliases = { Hi = "repeat hello" }

[[guilds.players]]
user = 2
experience = 40
verified = true
linked_account = "roblox:77"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn bundles_come_from_seeds() {
        let store = MemoryStore::from_config(&config());
        let bundle = store
            .fetch_bundle(Some(GuildId(10)), UserId(2))
            .await
            .unwrap();
        let settings = bundle.guild.unwrap();
        assert_eq!(settings.prefix.as_deref(), Some("?"));
        assert_eq!(settings.aliases["hi"], "repeat hello");
        assert_eq!(bundle.player.unwrap().experience, 40);
        assert!(bundle.verification.unwrap().verified);

        let dm = store.fetch_bundle(None, UserId(2)).await.unwrap();
        assert!(dm.guild.is_none());
        assert!(dm.player.is_none());
        assert!(dm.verification.is_some());

        assert!(store.bot_admins().await.unwrap().contains(&UserId(1)));
    }

    #[tokio::test]
    async fn offline_store_fails_fetches() {
        let store = MemoryStore::new([]);
        store.set_unavailable(true);
        assert!(store.fetch_bundle(None, UserId(2)).await.is_err());
        store.set_unavailable(false);
        assert!(store.fetch_bundle(None, UserId(2)).await.is_ok());
        assert_eq!(store.fetch_count(), 1);
    }
}
