use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{
    self as serenity, Cache, ChannelId, GuildId, Http, MessageId, Permissions, RoleId, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{
    AccessRule, AccessTarget, ButtonTone, ChannelKind, ChannelRequest, ChannelSummary,
    EmbedContent, HistoryMessage, MemberSummary, OutgoingMessage, Platform,
};
use crate::error::{BotError, Result};

/// Text access granted by a bypass overwrite
pub const MEMBER_TEXT_ACCESS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::READ_MESSAGE_HISTORY)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::EMBED_LINKS);

/// [`Platform`] backed by serenity's HTTP client and gateway cache
pub struct SerenityPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    bot_user_id: UserId,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, bot_user_id: UserId) -> Self {
        Self {
            http,
            cache,
            bot_user_id,
        }
    }

    fn http(&self) -> &Http {
        self.http.as_ref()
    }

    /// Owner id and role permissions, from the cache when the guild is cached
    async fn guild_permissions(&self, guild: GuildId) -> Result<(UserId, HashMap<RoleId, Permissions>)> {
        let cached = self.cache.guild(guild).map(|g| {
            let roles = g.roles.iter().map(|(id, r)| (*id, r.permissions)).collect();
            (g.owner_id, roles)
        });
        if let Some(found) = cached {
            return Ok(found);
        }

        let partial = guild.to_partial_guild(self.http()).await?;
        let roles = partial
            .roles
            .iter()
            .map(|(id, r)| (*id, r.permissions))
            .collect();
        Ok((partial.owner_id, roles))
    }
}

fn is_not_found(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(http_err) => {
            http_err.status_code().map(|s| s.as_u16()) == Some(404)
        }
        _ => false,
    }
}

fn channel_error(channel: ChannelId, err: serenity::Error) -> BotError {
    if is_not_found(&err) {
        BotError::ChannelNotFound {
            id: channel.to_string(),
        }
    } else {
        err.into()
    }
}

fn to_overwrite(guild: GuildId, rule: &AccessRule) -> serenity::PermissionOverwrite {
    let kind = match rule.target {
        // The @everyone role shares the guild's id
        AccessTarget::Everyone => serenity::PermissionOverwriteType::Role(RoleId::new(guild.get())),
        AccessTarget::Role(role) => serenity::PermissionOverwriteType::Role(role),
        AccessTarget::Member(user) => serenity::PermissionOverwriteType::Member(user),
    };
    serenity::PermissionOverwrite {
        allow: rule.allow,
        deny: rule.deny,
        kind,
    }
}

impl From<EmbedContent> for serenity::CreateEmbed {
    fn from(content: EmbedContent) -> Self {
        let mut embed = serenity::CreateEmbed::new().color(content.color);
        if !content.description.is_empty() {
            embed = embed.description(content.description);
        }
        if let Some(title) = content.title {
            embed = embed.title(title);
        }
        for field in content.fields {
            embed = embed.field(field.name, field.value, field.inline);
        }
        if let Some(footer) = content.footer.filter(|f| !f.trim().is_empty()) {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
        }
        if let Some(url) = content.thumbnail {
            embed = embed.thumbnail(url);
        }
        if let Some(url) = content.image {
            embed = embed.image(url);
        }
        if content.timestamp {
            embed = embed.timestamp(serenity::Timestamp::now());
        }
        embed
    }
}

fn button_style(tone: ButtonTone) -> serenity::ButtonStyle {
    match tone {
        ButtonTone::Primary => serenity::ButtonStyle::Primary,
        ButtonTone::Secondary => serenity::ButtonStyle::Secondary,
        ButtonTone::Success => serenity::ButtonStyle::Success,
        ButtonTone::Danger => serenity::ButtonStyle::Danger,
    }
}

impl From<OutgoingMessage> for serenity::CreateMessage {
    fn from(message: OutgoingMessage) -> Self {
        let mut builder = serenity::CreateMessage::new();
        if let Some(content) = message.content {
            builder = builder.content(content);
        }
        if let Some(embed) = message.embed {
            builder = builder.embed(embed.into());
        }

        let mut rows = Vec::new();
        if !message.buttons.is_empty() {
            let buttons = message
                .buttons
                .into_iter()
                .map(|b| {
                    serenity::CreateButton::new(b.action.to_string())
                        .label(b.label)
                        .style(button_style(b.tone))
                })
                .collect();
            rows.push(serenity::CreateActionRow::Buttons(buttons));
        }
        if let Some(select) = message.select {
            let options = select
                .options
                .into_iter()
                .map(|o| {
                    let option = serenity::CreateSelectMenuOption::new(o.label, o.value);
                    match o.description {
                        Some(description) if !description.is_empty() => {
                            option.description(description)
                        }
                        _ => option,
                    }
                })
                .collect();
            rows.push(serenity::CreateActionRow::SelectMenu(
                serenity::CreateSelectMenu::new(
                    select.action.to_string(),
                    serenity::CreateSelectMenuKind::String { options },
                )
                .placeholder(select.placeholder),
            ));
        }
        if !rows.is_empty() {
            builder = builder.components(rows);
        }

        if let Some(attachment) = message.attachment {
            builder = builder.add_file(serenity::CreateAttachment::bytes(
                attachment.data,
                attachment.filename,
            ));
        }
        builder
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    fn bot_user_id(&self) -> UserId {
        self.bot_user_id
    }

    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<MessageId> {
        let sent = channel
            .send_message(self.http(), message.into())
            .await
            .map_err(|e| channel_error(channel, e))?;
        Ok(sent.id)
    }

    async fn send_direct_message(&self, user: UserId, message: OutgoingMessage) -> Result<()> {
        user.direct_message(self.http(), message.into()).await?;
        Ok(())
    }

    async fn create_channel(&self, guild: GuildId, request: ChannelRequest) -> Result<ChannelId> {
        let overwrites: Vec<serenity::PermissionOverwrite> = request
            .access
            .iter()
            .map(|rule| to_overwrite(guild, rule))
            .collect();

        let kind = match request.kind {
            ChannelKind::Text => serenity::ChannelType::Text,
            ChannelKind::Voice => serenity::ChannelType::Voice,
        };

        let mut builder = serenity::CreateChannel::new(&request.name)
            .kind(kind)
            .permissions(overwrites);
        if let Some(parent) = request.parent {
            builder = builder.category(parent);
        }
        if let Some(topic) = &request.topic {
            builder = builder.topic(topic);
        }
        if let Some(reason) = &request.reason {
            builder = builder.audit_log_reason(reason);
        }

        let channel = guild.create_channel(self.http(), builder).await?;
        debug!("Created channel {} ({}) in guild {}", channel.name, channel.id, guild);
        Ok(channel.id)
    }

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()> {
        channel
            .edit(self.http(), serenity::EditChannel::new().name(name))
            .await
            .map_err(|e| channel_error(channel, e))?;
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        channel
            .delete(self.http())
            .await
            .map_err(|e| channel_error(channel, e))?;
        Ok(())
    }

    async fn channel(&self, channel: ChannelId) -> Result<Option<ChannelSummary>> {
        let fetched = match channel.to_channel(self.http()).await {
            Ok(fetched) => fetched,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(fetched.guild().map(|c| ChannelSummary {
            id: c.id,
            name: c.name.clone(),
            parent_id: c.parent_id,
        }))
    }

    async fn message_history(&self, channel: ChannelId, limit: u8) -> Result<Vec<HistoryMessage>> {
        // Asking for messages after the smallest possible id yields the oldest ones
        let mut messages = channel
            .messages(
                self.http(),
                serenity::GetMessages::new()
                    .after(MessageId::new(1))
                    .limit(limit.clamp(1, 100)),
            )
            .await
            .map_err(|e| channel_error(channel, e))?;
        messages.sort_by_key(|m| m.id);

        Ok(messages
            .into_iter()
            .map(|m| HistoryMessage {
                author_id: m.author.id,
                author_name: m.author.name.clone(),
                author_bot: m.author.bot,
                content: m.content.clone(),
                timestamp: DateTime::from_timestamp(m.timestamp.unix_timestamp(), 0)
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn member(&self, guild: GuildId, user: UserId) -> Result<Option<MemberSummary>> {
        let cached = self.cache.member(guild, user).map(|m| m.clone());
        let member = match cached {
            Some(member) => member,
            None => match guild.member(self.http(), user).await {
                Ok(member) => member,
                Err(e) if is_not_found(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            },
        };

        let (owner_id, roles) = self.guild_permissions(guild).await?;
        let everyone = RoleId::new(guild.get());
        let is_admin = owner_id == member.user.id
            || member
                .roles
                .iter()
                .chain(std::iter::once(&everyone))
                .filter_map(|role| roles.get(role))
                .any(|perms| perms.administrator());

        Ok(Some(MemberSummary {
            user_id: member.user.id,
            name: member.user.name.clone(),
            is_bot: member.user.bot,
            is_admin,
            avatar_url: Some(member.face()),
        }))
    }

    async fn role_exists(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        let cached = self.cache.guild(guild).map(|g| g.roles.contains_key(&role));
        if let Some(found) = cached {
            return Ok(found);
        }
        let roles = guild.roles(self.http()).await?;
        Ok(roles.contains_key(&role))
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(guild, user, role, Some("Welcome role"))
            .await?;
        Ok(())
    }

    async fn ban_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()> {
        guild.ban_with_reason(self.http(), user, 0, reason).await?;
        Ok(())
    }

    async fn unban_member(&self, guild: GuildId, user: UserId) -> Result<()> {
        match guild.unban(self.http(), user).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Err(BotError::NotFound {
                what: format!("ban for user {}", user),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn kick_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()> {
        guild.kick_with_reason(self.http(), user, reason).await?;
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<()> {
        let builder = match until {
            Some(until) => serenity::EditMember::new().disable_communication_until(until.to_rfc3339()),
            None => serenity::EditMember::new().enable_communication(),
        };
        guild
            .edit_member(self.http(), user, builder.audit_log_reason(reason))
            .await?;
        Ok(())
    }

    async fn move_member(&self, guild: GuildId, user: UserId, channel: ChannelId) -> Result<()> {
        guild.move_member(self.http(), user, channel).await?;
        Ok(())
    }

    async fn voice_occupancy(&self, guild: GuildId, channel: ChannelId) -> Result<usize> {
        self.cache
            .guild(guild)
            .map(|g| {
                g.voice_states
                    .values()
                    .filter(|state| state.channel_id == Some(channel))
                    .count()
            })
            .ok_or_else(|| BotError::Internal {
                message: format!("guild {} is not cached", guild),
            })
    }

    async fn set_member_access(&self, channel: ChannelId, user: UserId, granted: bool) -> Result<()> {
        let result = if granted {
            channel
                .create_permission(
                    self.http(),
                    serenity::PermissionOverwrite {
                        allow: MEMBER_TEXT_ACCESS,
                        deny: Permissions::empty(),
                        kind: serenity::PermissionOverwriteType::Member(user),
                    },
                )
                .await
        } else {
            channel
                .delete_permission(self.http(), serenity::PermissionOverwriteType::Member(user))
                .await
        };
        result.map_err(|e| channel_error(channel, e))
    }
}
