use poise::serenity_prelude::{ChannelId, GuildId, MessageId, UserId};
use tracing::{debug, warn};

use crate::config::{LogKind, LogsConfig};
use crate::error::Result;
use crate::messages::{COLOR_DANGER, COLOR_INFO, COLOR_SUCCESS, COLOR_WARNING};
use crate::platform::{mention_channel, mention_user, truncate_chars, EmbedContent, OutgoingMessage, Platform};
use crate::state::{CachedMessage, SharedMessageCache, SharedStore};

/// Embed field values are capped at 1024 characters
const FIELD_LIMIT: usize = 1024;

/// Post an embed to one of the guild's log channels, if configured.
///
/// Logging never fails the action being logged; errors are only traced.
pub async fn post_log(
    platform: &dyn Platform,
    logs: &SharedStore<LogsConfig>,
    guild: GuildId,
    kind: LogKind,
    embed: EmbedContent,
) {
    let Some(channel) = logs.get(&guild.to_string()).await.channel(kind) else {
        return;
    };
    if let Err(e) = platform
        .send_message(channel, OutgoingMessage::embed(embed.timestamped()))
        .await
    {
        warn!("Failed to post {:?} log in guild {}: {}", kind, guild, e);
    }
}

fn field_text(content: &str) -> String {
    if content.is_empty() {
        "*no text content*".to_string()
    } else {
        truncate_chars(content, FIELD_LIMIT)
    }
}

/// Mirrors server events into the configured log channels
pub struct EventLogger {
    logs: SharedStore<LogsConfig>,
    cache: SharedMessageCache,
}

impl EventLogger {
    pub fn new(logs: SharedStore<LogsConfig>, cache: SharedMessageCache) -> Self {
        Self { logs, cache }
    }

    pub async fn set_channel(&self, guild: GuildId, kind: LogKind, channel: ChannelId) -> Result<()> {
        self.logs
            .update(&guild.to_string(), |config| config.set_channel(kind, channel))
            .await
    }

    /// A non-bot message was posted
    pub async fn on_message(&self, platform: &dyn Platform, guild: GuildId, message: CachedMessage) {
        let log_channel = self.logs.get(&guild.to_string()).await.channel(LogKind::Message);
        // Never mirror the log channel into itself
        if log_channel == Some(message.channel_id) {
            return;
        }
        self.cache.insert(message.clone());

        let embed = EmbedContent::new(
            format!(
                "💬 Message sent by {} in {}",
                mention_user(message.author_id),
                mention_channel(message.channel_id)
            ),
            COLOR_INFO,
        )
        .field("Content", field_text(&message.content), false)
        .footer(format!("Message ID: {}", message.id));
        post_log(platform, &self.logs, guild, LogKind::Message, embed).await;
    }

    /// A message was edited; `author` is None when unknown
    pub async fn on_message_edit(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        id: MessageId,
        author: Option<UserId>,
        new_content: &str,
    ) {
        let previous = self.cache.update_content(id, new_content);
        let (author, before) = match previous {
            Some(previous) if previous.content == new_content => {
                debug!("Ignoring edit of message {} with unchanged content", id);
                return;
            }
            Some(previous) => (previous.author_id, field_text(&previous.content)),
            None => match author {
                Some(author) => (author, "*not in the recent message cache*".to_string()),
                None => return,
            },
        };

        let embed = EmbedContent::new(
            format!(
                "✏️ Message edited by {} in {}",
                mention_user(author),
                mention_channel(channel)
            ),
            COLOR_WARNING,
        )
        .field("Before", before, false)
        .field("After", field_text(new_content), false)
        .footer(format!("Message ID: {}", id));
        post_log(platform, &self.logs, guild, LogKind::Message, embed).await;
    }

    pub async fn on_message_delete(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        id: MessageId,
    ) {
        // Bot messages are never cached, so an unknown id may be one of ours
        let Some(deleted) = self.cache.take(id) else {
            debug!("Deleted message {} was not cached, skipping log", id);
            return;
        };

        let embed = EmbedContent::new(
            format!(
                "🗑️ Message by {} deleted in {}",
                mention_user(deleted.author_id),
                mention_channel(channel)
            ),
            COLOR_DANGER,
        )
        .field("Content", field_text(&deleted.content), false)
        .footer(format!("Message ID: {}", id));
        post_log(platform, &self.logs, guild, LogKind::Message, embed).await;
    }

    pub async fn on_channel_created(&self, platform: &dyn Platform, guild: GuildId, channel: ChannelId, name: &str) {
        let embed = EmbedContent::new(
            format!("📁 Channel created: {} (`{}`)", mention_channel(channel), name),
            COLOR_SUCCESS,
        );
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
    }

    pub async fn on_channel_deleted(&self, platform: &dyn Platform, guild: GuildId, name: &str) {
        let embed = EmbedContent::new(format!("📁 Channel deleted: `{}`", name), COLOR_DANGER);
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
    }

    pub async fn on_role_created(&self, platform: &dyn Platform, guild: GuildId, name: &str) {
        let embed = EmbedContent::new(format!("🏷️ Role created: `{}`", name), COLOR_SUCCESS);
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
    }

    pub async fn on_role_deleted(&self, platform: &dyn Platform, guild: GuildId, name: &str) {
        let embed = EmbedContent::new(format!("🏷️ Role deleted: `{}`", name), COLOR_DANGER);
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
    }
}
