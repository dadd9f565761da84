use poise::serenity_prelude::{ChannelId, GuildId, RoleId};
use tracing::{debug, info, warn};

use crate::config::WelcomeConfig;
use crate::error::{BotError, Result};
use crate::messages::COLOR_SUCCESS;
use crate::platform::{mention_user, EmbedContent, MemberSummary, OutgoingMessage, Platform};
use crate::state::SharedStore;

fn not_configured() -> BotError {
    BotError::NotFound {
        what: "welcome configuration (run /welcome create first)".to_string(),
    }
}

pub struct WelcomeManager {
    store: SharedStore<Option<WelcomeConfig>>,
}

impl WelcomeManager {
    pub fn new(store: SharedStore<Option<WelcomeConfig>>) -> Self {
        Self { store }
    }

    pub async fn config(&self, guild: GuildId) -> Option<WelcomeConfig> {
        self.store.get(&guild.to_string()).await
    }

    /// Set the channel and texts, keeping roles and image of an earlier setup
    pub async fn configure(&self, guild: GuildId, channel: ChannelId, title: &str, description: &str) -> Result<()> {
        self.store
            .update(&guild.to_string(), |slot| {
                let mut config = WelcomeConfig::new(channel, title, description);
                if let Some(previous) = slot.take() {
                    config.roles = previous.roles;
                    config.image_url = previous.image_url;
                }
                *slot = Some(config);
            })
            .await?;
        info!("Welcome message configured for guild {} in {}", guild, channel);
        Ok(())
    }

    /// Returns false when the role was already given on join
    pub async fn add_role(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        self.store
            .update(&guild.to_string(), |slot| {
                slot.as_mut().map(|config| config.add_role(role))
            })
            .await?
            .ok_or_else(not_configured)
    }

    pub async fn set_image(&self, guild: GuildId, url: Option<String>) -> Result<()> {
        self.store
            .update(&guild.to_string(), |slot| {
                slot.as_mut().map(|config| config.image_url = url)
            })
            .await?
            .ok_or_else(not_configured)
    }

    /// Returns false when nothing was configured
    pub async fn disable(&self, guild: GuildId) -> Result<bool> {
        Ok(self.store.remove(&guild.to_string()).await?.flatten().is_some())
    }

    /// Post the welcome message for `member` and hand out the join roles.
    ///
    /// Returns false when the guild has no welcome configured.
    pub async fn greet(&self, platform: &dyn Platform, guild: GuildId, member: &MemberSummary) -> Result<bool> {
        let Some(config) = self.config(guild).await else {
            return Ok(false);
        };
        let Some(channel) = config.channel_id() else {
            warn!("Welcome channel of guild {} is invalid", guild);
            return Ok(false);
        };

        let mention = mention_user(member.user_id);
        let embed = EmbedContent::new(config.render(&mention), COLOR_SUCCESS)
            .title(config.title.clone())
            .thumbnail(member.avatar_url.clone())
            .image(config.image_url.clone())
            .timestamped();
        platform
            .send_message(channel, OutgoingMessage::embed(embed).with_content(mention))
            .await?;

        for role in config.role_ids() {
            match platform.role_exists(guild, role).await {
                Ok(true) => {
                    if let Err(e) = platform.add_role(guild, member.user_id, role).await {
                        warn!("Failed to give welcome role {} to {}: {}", role, member.user_id, e);
                    }
                }
                Ok(false) => debug!("Welcome role {} no longer exists in guild {}", role, guild),
                Err(e) => warn!("Failed to look up welcome role {}: {}", role, e),
            }
        }
        info!("Welcomed {} in guild {}", member.name, guild);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use crate::state::open_shared_store;
    use poise::serenity_prelude::UserId;

    const GUILD: GuildId = GuildId::new(1);
    const WELCOME: ChannelId = ChannelId::new(20);

    async fn manager(dir: &tempfile::TempDir) -> WelcomeManager {
        let store = open_shared_store(&dir.path().join("welcome.json").to_string_lossy())
            .await
            .unwrap();
        WelcomeManager::new(store)
    }

    fn newcomer() -> MemberSummary {
        MemberSummary {
            user_id: UserId::new(7),
            name: "newbie".to_string(),
            is_bot: false,
            is_admin: false,
            avatar_url: Some("https://cdn.example/avatar.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_guild_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let welcome = manager(&dir).await;
        let platform = FakePlatform::new();

        assert!(!welcome.greet(&platform, GUILD, &newcomer()).await.unwrap());
        assert!(platform.calls().is_empty());
        assert!(matches!(
            welcome.add_role(GUILD, RoleId::new(5)).await,
            Err(BotError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_greet_renders_and_skips_missing_roles() {
        let dir = tempfile::tempdir().unwrap();
        let welcome = manager(&dir).await;
        let platform = FakePlatform::new().with_role(5);

        welcome
            .configure(GUILD, WELCOME, "Welcome!", "Glad to have you ???!")
            .await
            .unwrap();
        assert!(welcome.add_role(GUILD, RoleId::new(5)).await.unwrap());
        assert!(!welcome.add_role(GUILD, RoleId::new(5)).await.unwrap());
        assert!(welcome.add_role(GUILD, RoleId::new(6)).await.unwrap());

        assert!(welcome.greet(&platform, GUILD, &newcomer()).await.unwrap());
        let posted = platform.messages_in(WELCOME);
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].content.as_deref(), Some("<@7>"));
        let embed = posted[0].embed.as_ref().unwrap();
        assert_eq!(embed.description, "Glad to have you <@7>!");
        assert!(embed.thumbnail.is_some());

        let roles: Vec<RoleId> = platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddRole { role, .. } => Some(role),
                _ => None,
            })
            .collect();
        assert_eq!(roles, vec![RoleId::new(5)]);
    }

    #[tokio::test]
    async fn test_reconfigure_keeps_roles_and_disable() {
        let dir = tempfile::tempdir().unwrap();
        let welcome = manager(&dir).await;

        welcome.configure(GUILD, WELCOME, "Hi", "???").await.unwrap();
        welcome.add_role(GUILD, RoleId::new(5)).await.unwrap();
        welcome
            .set_image(GUILD, Some("https://cdn.example/banner.png".to_string()))
            .await
            .unwrap();
        welcome
            .configure(GUILD, ChannelId::new(21), "Hello", "Hey ???")
            .await
            .unwrap();

        let config = welcome.config(GUILD).await.unwrap();
        assert_eq!(config.channel, "21");
        assert_eq!(config.roles, vec!["5".to_string()]);
        assert!(config.image_url.is_some());

        assert!(welcome.disable(GUILD).await.unwrap());
        assert!(!welcome.disable(GUILD).await.unwrap());
        assert!(welcome.config(GUILD).await.is_none());
    }
}
