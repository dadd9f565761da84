use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use tracing::info;

use crate::error::{BotError, Result};
use crate::platform::Platform;
use crate::state::{GuildBypass, SharedStore};

/// Per-member access grants on individual channels
pub struct BypassManager {
    store: SharedStore<GuildBypass>,
}

impl BypassManager {
    pub fn new(store: SharedStore<GuildBypass>) -> Self {
        Self { store }
    }

    pub async fn grant(&self, platform: &dyn Platform, guild: GuildId, channel: ChannelId, user: UserId) -> Result<()> {
        let guild_key = guild.to_string();
        let (channel_key, user_key) = (channel.to_string(), user.to_string());
        if self
            .store
            .get(&guild_key)
            .await
            .users_in(&channel_key)
            .contains(&user_key)
        {
            return Err(BotError::validation(format!(
                "<@{}> already has access to <#{}>.",
                user, channel
            )));
        }

        platform.set_member_access(channel, user, true).await?;
        self.store
            .update(&guild_key, |bypass| bypass.add(&channel_key, &user_key))
            .await?;
        info!("Granted {} access to channel {} in guild {}", user, channel, guild);
        Ok(())
    }

    pub async fn revoke(&self, platform: &dyn Platform, guild: GuildId, channel: ChannelId, user: UserId) -> Result<()> {
        let guild_key = guild.to_string();
        let (channel_key, user_key) = (channel.to_string(), user.to_string());
        if !self
            .store
            .get(&guild_key)
            .await
            .users_in(&channel_key)
            .contains(&user_key)
        {
            return Err(BotError::NotFound {
                what: format!("bypass for <@{}> on <#{}>", user, channel),
            });
        }

        platform.set_member_access(channel, user, false).await?;
        self.store
            .update(&guild_key, |bypass| bypass.remove(&channel_key, &user_key))
            .await?;
        info!("Revoked {} access to channel {} in guild {}", user, channel, guild);
        Ok(())
    }

    /// Channel id -> granted users; limited to one channel when given
    pub async fn list(&self, guild: GuildId, channel: Option<ChannelId>) -> Vec<(String, Vec<String>)> {
        let bypass = self.store.get(&guild.to_string()).await;
        match channel {
            Some(channel) => {
                let key = channel.to_string();
                let users = bypass.users_in(&key).to_vec();
                if users.is_empty() {
                    Vec::new()
                } else {
                    vec![(key, users)]
                }
            }
            None => bypass.channels.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use crate::state::open_shared_store;

    const GUILD: GuildId = GuildId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(70);
    const USER: UserId = UserId::new(7);

    async fn manager(dir: &tempfile::TempDir) -> BypassManager {
        let store = open_shared_store(&dir.path().join("bypass.json").to_string_lossy())
            .await
            .unwrap();
        BypassManager::new(store)
    }

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let dir = tempfile::tempdir().unwrap();
        let bypass = manager(&dir).await;
        let platform = FakePlatform::new();

        bypass.grant(&platform, GUILD, CHANNEL, USER).await.unwrap();
        assert!(matches!(
            bypass.grant(&platform, GUILD, CHANNEL, USER).await,
            Err(BotError::Validation { .. })
        ));
        assert_eq!(
            bypass.list(GUILD, Some(CHANNEL)).await,
            vec![("70".to_string(), vec!["7".to_string()])]
        );

        bypass.revoke(&platform, GUILD, CHANNEL, USER).await.unwrap();
        assert!(bypass.list(GUILD, None).await.is_empty());
        assert!(matches!(
            bypass.revoke(&platform, GUILD, CHANNEL, USER).await,
            Err(BotError::NotFound { .. })
        ));

        assert_eq!(
            platform.calls(),
            vec![
                Call::SetAccess {
                    channel: CHANNEL,
                    user: USER,
                    granted: true
                },
                Call::SetAccess {
                    channel: CHANNEL,
                    user: USER,
                    granted: false
                },
            ]
        );
    }
}
