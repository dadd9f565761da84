//! The platform calls the bot's features depend on.
//!
//! Managers talk to Discord only through [`Platform`], so the same feature
//! code runs against serenity in production and against a recording fake in
//! tests.

pub mod discord;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, Permissions, RoleId, UserId};

use crate::components::ComponentAction;
use crate::error::Result;

pub use discord::SerenityPlatform;

#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own user id
    fn bot_user_id(&self) -> UserId;

    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage)
        -> Result<MessageId>;
    async fn send_direct_message(&self, user: UserId, message: OutgoingMessage) -> Result<()>;

    async fn create_channel(&self, guild: GuildId, request: ChannelRequest) -> Result<ChannelId>;
    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()>;
    async fn delete_channel(&self, channel: ChannelId) -> Result<()>;
    async fn channel(&self, channel: ChannelId) -> Result<Option<ChannelSummary>>;
    /// Oldest messages of a channel, oldest first
    async fn message_history(&self, channel: ChannelId, limit: u8) -> Result<Vec<HistoryMessage>>;

    /// None when the user is not (or no longer) a member of the guild
    async fn member(&self, guild: GuildId, user: UserId) -> Result<Option<MemberSummary>>;
    async fn role_exists(&self, guild: GuildId, role: RoleId) -> Result<bool>;
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    async fn ban_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()>;
    async fn unban_member(&self, guild: GuildId, user: UserId) -> Result<()>;
    async fn kick_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()>;
    /// `None` lifts an active timeout
    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<()>;

    async fn move_member(&self, guild: GuildId, user: UserId, channel: ChannelId) -> Result<()>;
    /// Number of members currently connected to a voice channel
    async fn voice_occupancy(&self, guild: GuildId, channel: ChannelId) -> Result<usize>;

    /// Grant (or remove) a per-member overwrite giving full text access
    async fn set_member_access(&self, channel: ChannelId, user: UserId, granted: bool)
        -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTarget {
    Everyone,
    Role(RoleId),
    Member(UserId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessRule {
    pub target: AccessTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl AccessRule {
    pub fn allow(target: AccessTarget, allow: Permissions) -> Self {
        Self {
            target,
            allow,
            deny: Permissions::empty(),
        }
    }

    pub fn deny(target: AccessTarget, deny: Permissions) -> Self {
        Self {
            target,
            allow: Permissions::empty(),
            deny,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRequest {
    pub name: String,
    pub kind: ChannelKind,
    pub parent: Option<ChannelId>,
    pub topic: Option<String>,
    pub access: Vec<AccessRule>,
    pub reason: Option<String>,
}

impl ChannelRequest {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            topic: None,
            access: Vec::new(),
            reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
    pub parent_id: Option<ChannelId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
    pub user_id: UserId,
    pub name: String,
    pub is_bot: bool,
    /// Guild owner or holder of a role with ADMINISTRATOR
    pub is_admin: bool,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    pub author_id: UserId,
    pub author_name: String,
    pub author_bot: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonContent {
    pub action: ComponentAction,
    pub label: String,
    pub tone: ButtonTone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectContent {
    pub action: ComponentAction,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedContent {
    pub title: Option<String>,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub timestamp: bool,
}

impl EmbedContent {
    pub fn new(description: impl Into<String>, color: u32) -> Self {
        Self {
            description: description.into(),
            color,
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url;
        self
    }

    pub fn timestamped(mut self) -> Self {
        self.timestamp = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentContent {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A message to post, independent of the client library
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<EmbedContent>,
    pub buttons: Vec<ButtonContent>,
    pub select: Option<SelectContent>,
    pub attachment: Option<AttachmentContent>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: EmbedContent) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.content = if content.is_empty() { None } else { Some(content) };
        self
    }

    pub fn with_button(mut self, action: ComponentAction, label: &str, tone: ButtonTone) -> Self {
        self.buttons.push(ButtonContent {
            action,
            label: label.to_string(),
            tone,
        });
        self
    }

    pub fn with_select(mut self, select: SelectContent) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_attachment(mut self, filename: &str, data: Vec<u8>) -> Self {
        self.attachment = Some(AttachmentContent {
            filename: filename.to_string(),
            data,
        });
        self
    }
}

/// Discord caps message content at 2000 characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

pub fn mention_user(user: UserId) -> String {
    format!("<@{}>", user)
}

pub fn mention_role(role: RoleId) -> String {
    format!("<@&{}>", role)
}

pub fn mention_channel(channel: ChannelId) -> String {
    format!("<#{}>", channel)
}
