use poise::serenity_prelude::{ChannelId, GuildId, Permissions, RoleId, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::platform::{AccessRule, AccessTarget, ChannelKind, ChannelRequest, Platform};
use crate::state::{CloneRecord, GuildVoice, HubConfig, SharedStore};

fn voice_access() -> Permissions {
    Permissions::VIEW_CHANNEL | Permissions::CONNECT | Permissions::SPEAK
}

/// Hub channels that spawn a personal clone for whoever joins them
pub struct VoiceManager {
    store: SharedStore<GuildVoice>,
    /// Serializes clone creation so numbers are never handed out twice
    spawn_lock: Mutex<()>,
}

impl VoiceManager {
    pub fn new(store: SharedStore<GuildVoice>) -> Self {
        Self {
            store,
            spawn_lock: Mutex::new(()),
        }
    }

    pub async fn hubs(&self, guild: GuildId) -> Vec<(String, HubConfig)> {
        self.store
            .get(&guild.to_string())
            .await
            .hubs
            .into_iter()
            .collect()
    }

    /// Create a new voice channel and make it a hub
    pub async fn create_hub(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        name: &str,
        parent: Option<ChannelId>,
        visible_role: Option<RoleId>,
    ) -> Result<ChannelId> {
        let mut request = ChannelRequest::new(name, ChannelKind::Voice);
        request.parent = parent;
        request.reason = Some("Voice hub".to_string());
        let channel = platform.create_channel(guild, request).await?;
        self.register_hub(guild, channel, name, visible_role).await?;
        Ok(channel)
    }

    /// Turn an existing voice channel into a hub
    pub async fn register_hub(
        &self,
        guild: GuildId,
        channel: ChannelId,
        base_name: &str,
        visible_role: Option<RoleId>,
    ) -> Result<()> {
        let base_name = base_name.trim();
        if base_name.is_empty() {
            return Err(BotError::validation("The clone name cannot be empty."));
        }
        let hub = HubConfig {
            base_name: base_name.to_string(),
            visible_role: visible_role.map(|r| r.to_string()),
        };
        self.store
            .update(&guild.to_string(), |voice| {
                voice.hubs.insert(channel.to_string(), hub)
            })
            .await?;
        info!("Registered voice hub {} in guild {}", channel, guild);
        Ok(())
    }

    pub async fn remove_hub(&self, guild: GuildId, channel: ChannelId) -> Result<bool> {
        let removed = self
            .store
            .update(&guild.to_string(), |voice| {
                voice.hubs.remove(&channel.to_string()).is_some()
            })
            .await?;
        Ok(removed)
    }

    /// React to a member moving between voice channels
    pub async fn on_voice_update(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        user: UserId,
        old_channel: Option<ChannelId>,
        new_channel: Option<ChannelId>,
    ) -> Result<()> {
        if old_channel == new_channel {
            return Ok(());
        }
        let mut spawned = Ok(());
        if let Some(joined) = new_channel {
            let hub = self
                .store
                .get(&guild.to_string())
                .await
                .hubs
                .get(&joined.to_string())
                .cloned();
            if let Some(hub) = hub {
                spawned = self
                    .spawn_clone(platform, guild, user, joined, &hub)
                    .await
                    .map(|_| ());
            }
        }
        // The channel left behind is cleaned up even when spawning failed
        if let Some(left) = old_channel {
            self.cleanup_clone(platform, guild, left).await?;
        }
        spawned
    }

    async fn spawn_clone(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        user: UserId,
        hub_id: ChannelId,
        hub: &HubConfig,
    ) -> Result<ChannelId> {
        let _guard = self.spawn_lock.lock().await;

        let hub_key = hub_id.to_string();
        let number = self
            .store
            .get(&guild.to_string())
            .await
            .next_clone_number(&hub_key);
        let parent = platform.channel(hub_id).await?.and_then(|c| c.parent_id);

        let mut request = ChannelRequest::new(hub.clone_name(number), ChannelKind::Voice);
        request.parent = parent;
        request.reason = Some(format!("Voice clone for {}", user));
        if let Some(role) = hub.visible_role_id() {
            request.access = vec![
                AccessRule::deny(AccessTarget::Everyone, Permissions::VIEW_CHANNEL),
                AccessRule::allow(AccessTarget::Role(role), voice_access()),
                AccessRule::allow(AccessTarget::Member(user), voice_access()),
            ];
        }
        let clone = platform.create_channel(guild, request).await?;
        self.store
            .update(&guild.to_string(), |voice| {
                voice.clones.insert(
                    clone.to_string(),
                    CloneRecord {
                        hub_id: hub_key.clone(),
                        number,
                    },
                )
            })
            .await?;

        if let Err(e) = platform.move_member(guild, user, clone).await {
            warn!("Failed to move {} into voice clone {}: {}", user, clone, e);
            self.delete_clone(platform, guild, clone).await?;
            return Err(e);
        }
        debug!("Spawned voice clone {} ({}) for {}", clone, hub.clone_name(number), user);
        Ok(clone)
    }

    /// Delete a clone once its last member has left
    async fn cleanup_clone(&self, platform: &dyn Platform, guild: GuildId, channel: ChannelId) -> Result<()> {
        let is_clone = self
            .store
            .get(&guild.to_string())
            .await
            .clones
            .contains_key(&channel.to_string());
        if !is_clone || platform.voice_occupancy(guild, channel).await? > 0 {
            return Ok(());
        }
        self.delete_clone(platform, guild, channel).await
    }

    async fn delete_clone(&self, platform: &dyn Platform, guild: GuildId, channel: ChannelId) -> Result<()> {
        match platform.delete_channel(channel).await {
            Ok(()) => debug!("Deleted empty voice clone {}", channel),
            Err(e) if e.is_gone() => debug!("Voice clone {} already gone", channel),
            Err(e) => return Err(e),
        }
        self.store
            .update(&guild.to_string(), |voice| {
                voice.clones.remove(&channel.to_string())
            })
            .await?;
        Ok(())
    }
}
