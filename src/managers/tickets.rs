use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, Permissions, RoleId, UserId};
use tracing::{debug, info, warn};

use crate::components::ComponentAction;
use crate::config::guild::parse_id;
use crate::config::settings::MAX_TRANSCRIPT_LIMIT;
use crate::config::{LogKind, LogsConfig, TicketCategory, TicketConfig};
use crate::duration::format_seconds;
use crate::error::{BotError, Result};
use crate::managers::event_log::post_log;
use crate::messages::{
    ticket_closed_message, ticket_opened_message, COLOR_DANGER, COLOR_INFO, COLOR_SUCCESS,
};
use crate::platform::{
    mention_role, mention_user, AccessRule, AccessTarget, ButtonTone, ChannelKind, ChannelRequest,
    EmbedContent, OutgoingMessage, Platform, SelectContent, SelectOption,
};
use crate::state::{GuildTickets, SharedStore, TicketRecord};

const CLOSED_PREFIX: &str = "closed-";

fn opener_access() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ATTACH_FILES
}

fn staff_access() -> Permissions {
    Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY
}

fn bot_access() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::MANAGE_CHANNELS
}

/// `ticket-<username>` reduced to characters Discord keeps in channel names
pub fn ticket_channel_name(username: &str) -> String {
    let slug: String = username
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if slug.is_empty() {
        "ticket-user".to_string()
    } else {
        format!("ticket-{}", slug)
    }
}

/// Who is acting on a ticket, and whether they hold MANAGE_CHANNELS
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: UserId,
    pub can_manage: bool,
}

/// Ticket lifecycle: open, claim, close, transcript and deletion sweep
pub struct TicketManager {
    store: SharedStore<GuildTickets>,
    logs: SharedStore<LogsConfig>,
    delete_after: chrono::Duration,
    transcript_limit: usize,
}

impl TicketManager {
    pub fn new(
        store: SharedStore<GuildTickets>,
        logs: SharedStore<LogsConfig>,
        delete_after: chrono::Duration,
        transcript_limit: usize,
    ) -> Self {
        Self {
            store,
            logs,
            delete_after,
            transcript_limit: transcript_limit.clamp(1, MAX_TRANSCRIPT_LIMIT),
        }
    }

    pub async fn config(&self, guild: GuildId) -> TicketConfig {
        self.store.get(&guild.to_string()).await.config
    }

    pub async fn ticket(&self, guild: GuildId, channel: ChannelId) -> Option<TicketRecord> {
        self.store
            .get(&guild.to_string())
            .await
            .tickets
            .get(&channel.to_string())
            .cloned()
    }

    /// Open a ticket in `category` for `opener`
    pub async fn create(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        opener: UserId,
        opener_name: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<TicketRecord> {
        let config = self.config(guild).await;
        let category = config.find_category(category).ok_or_else(|| {
            BotError::validation(format!(
                "Unknown ticket category '{}'. Available: {}",
                category,
                config
                    .effective_categories()
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let mut request = ChannelRequest::new(ticket_channel_name(opener_name), ChannelKind::Text);
        request.topic = Some(format!("{} ticket opened by {}", category.name, opener_name));
        request.reason = Some(format!("Ticket opened by {}", opener_name));
        request.access = vec![
            AccessRule::deny(AccessTarget::Everyone, Permissions::VIEW_CHANNEL),
            AccessRule::allow(AccessTarget::Member(opener), opener_access()),
            AccessRule::allow(AccessTarget::Member(platform.bot_user_id()), bot_access()),
        ];
        if let Some(role) = config.ping_role_id() {
            request
                .access
                .push(AccessRule::allow(AccessTarget::Role(role), staff_access()));
        }

        let channel = platform.create_channel(guild, request).await?;
        let record = TicketRecord::open(&channel.to_string(), &opener.to_string(), &category.name, now);
        self.store
            .update(&guild.to_string(), |t| {
                t.tickets.insert(record.id.clone(), record.clone());
            })
            .await?;
        info!(
            "Opened {} ticket {} for user {} in guild {}",
            category.name, channel, opener, guild
        );

        platform
            .send_message(channel, opening_message(&config, &category, opener))
            .await?;

        let embed = EmbedContent::new(
            format!(
                "🎫 Ticket <#{}> opened by {} ({})",
                channel,
                mention_user(opener),
                category.name
            ),
            COLOR_SUCCESS,
        );
        post_log(platform, &self.logs, guild, LogKind::Ticket, embed).await;

        Ok(record)
    }

    /// OPEN -> CLAIMED
    pub async fn claim(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        actor: Actor,
    ) -> Result<TicketRecord> {
        if !actor.can_manage {
            return Err(BotError::PermissionDenied {
                message: "only staff with Manage Channels can claim tickets".to_string(),
            });
        }

        let key = channel.to_string();
        let by = actor.id.to_string();
        let outcome = self
            .store
            .update(&guild.to_string(), |t| {
                t.tickets.get_mut(&key).map(|record| {
                    record.claim(&by).map(|()| record.clone())
                })
            })
            .await?;
        let record = match outcome {
            None => return Err(not_a_ticket()),
            Some(Err(refused)) => return Err(BotError::validation(refused.to_string())),
            Some(Ok(record)) => record,
        };
        info!("Ticket {} claimed by {}", channel, actor.id);

        platform
            .send_message(
                channel,
                OutgoingMessage::embed(EmbedContent::new(
                    format!("🙋 This ticket has been claimed by {}.", mention_user(actor.id)),
                    COLOR_INFO,
                )),
            )
            .await?;

        let embed = EmbedContent::new(
            format!("🙋 Ticket <#{}> claimed by {}", channel, mention_user(actor.id)),
            COLOR_INFO,
        );
        post_log(platform, &self.logs, guild, LogKind::Ticket, embed).await;

        Ok(record)
    }

    /// OPEN or CLAIMED -> CLOSED, then rename, transcript and notice
    pub async fn close(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<TicketRecord> {
        if !actor.can_manage {
            return Err(BotError::PermissionDenied {
                message: "only staff with Manage Channels can close tickets".to_string(),
            });
        }

        let key = channel.to_string();
        let by = actor.id.to_string();
        let outcome = self
            .store
            .update(&guild.to_string(), |t| {
                t.tickets.get_mut(&key).map(|record| {
                    record.close(&by, now).map(|()| record.clone())
                })
            })
            .await?;
        let record = match outcome {
            None => return Err(not_a_ticket()),
            Some(Err(refused)) => return Err(BotError::validation(refused.to_string())),
            Some(Ok(record)) => record,
        };
        info!("Ticket {} closed by {}", channel, actor.id);

        if let Some(summary) = platform.channel(channel).await? {
            if !summary.name.starts_with(CLOSED_PREFIX) {
                let renamed = format!("{}{}", CLOSED_PREFIX, summary.name);
                if let Err(e) = platform.rename_channel(channel, &renamed).await {
                    warn!("Failed to rename closed ticket {}: {}", channel, e);
                }
            }
        }

        self.forward_transcript(platform, guild, channel, &record, actor.id)
            .await;

        let delete_after = format_seconds(self.delete_after.num_seconds().max(0) as u64);
        platform
            .send_message(
                channel,
                OutgoingMessage::embed(EmbedContent::new(
                    ticket_closed_message(&mention_user(actor.id), &delete_after),
                    COLOR_DANGER,
                )),
            )
            .await?;

        let embed = EmbedContent::new(
            format!("🔒 Ticket <#{}> closed by {}", channel, mention_user(actor.id)),
            COLOR_DANGER,
        );
        post_log(platform, &self.logs, guild, LogKind::Ticket, embed).await;

        Ok(record)
    }

    /// Plain-text transcript of the first non-bot messages, oldest first
    pub async fn build_transcript(&self, platform: &dyn Platform, channel: ChannelId) -> Result<String> {
        let history = platform.message_history(channel, MAX_TRANSCRIPT_LIMIT as u8).await?;
        let lines: Vec<String> = history
            .into_iter()
            .filter(|m| !m.author_bot)
            .take(self.transcript_limit)
            .map(|m| {
                format!(
                    "[{}] {}: {}",
                    m.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    m.author_name,
                    m.content
                )
            })
            .collect();
        if lines.is_empty() {
            Ok("(no messages)".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }

    fn transcript_message(&self, channel: ChannelId, record: &TicketRecord, transcript: String) -> OutgoingMessage {
        OutgoingMessage::embed(
            EmbedContent::new(
                format!(
                    "📄 Transcript of the **{}** ticket opened by <@{}> (<#{}>)",
                    record.category, record.user_id, channel
                ),
                COLOR_INFO,
            )
            .timestamped(),
        )
        .with_attachment(&format!("transcript-{}.txt", channel), transcript.into_bytes())
    }

    /// Send the transcript to the transcript channel, or the closer's DMs
    async fn forward_transcript(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        record: &TicketRecord,
        closer: UserId,
    ) {
        let transcript = match self.build_transcript(platform, channel).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!("Failed to build transcript for ticket {}: {}", channel, e);
                return;
            }
        };
        let message = self.transcript_message(channel, record, transcript);

        if let Some(target) = self.config(guild).await.transcript_channel_id() {
            match platform.send_message(target, message.clone()).await {
                Ok(_) => return,
                Err(e) => warn!("Failed to post transcript to {}: {}", target, e),
            }
        }
        if let Err(e) = platform.send_direct_message(closer, message).await {
            debug!("Could not DM transcript to {}: {}", closer, e);
        }
    }

    /// Transcript button: DM the transcript to whoever asked
    pub async fn send_transcript(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        channel: ChannelId,
        requester: UserId,
    ) -> Result<()> {
        let record = self.ticket(guild, channel).await.ok_or_else(not_a_ticket)?;
        let transcript = self.build_transcript(platform, channel).await?;
        platform
            .send_direct_message(requester, self.transcript_message(channel, &record, transcript))
            .await
    }

    /// Delete every closed ticket past its retention; returns how many went
    pub async fn sweep(&self, platform: &dyn Platform, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for (guild_id, guild) in self.store.snapshot().await {
            for record in guild.due_for_deletion(now, self.delete_after) {
                let Some(raw) = parse_id(Some(&record.id)) else {
                    warn!("Dropping ticket with invalid channel id '{}'", record.id);
                    self.forget(&guild_id, &record.id).await;
                    continue;
                };
                match platform.delete_channel(ChannelId::new(raw)).await {
                    Ok(()) => debug!("Deleted ticket channel {}", record.id),
                    Err(e) if e.is_gone() => debug!("Ticket channel {} already gone", record.id),
                    Err(e) => {
                        warn!("Failed to delete ticket channel {}, will retry: {}", record.id, e);
                        continue;
                    }
                }
                if self.forget(&guild_id, &record.id).await {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!("Ticket sweep removed {} closed ticket(s)", removed);
        }
        removed
    }

    async fn forget(&self, guild_id: &str, ticket_id: &str) -> bool {
        match self
            .store
            .update(guild_id, |t| t.tickets.remove(ticket_id).is_some())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to drop ticket {}: {}", ticket_id, e);
                false
            }
        }
    }

    /// Panel with a category select menu
    pub async fn panel_message(&self, guild: GuildId) -> OutgoingMessage {
        let config = self.config(guild).await;
        let options = config
            .effective_categories()
            .into_iter()
            .map(|c| SelectOption {
                label: format!("{} {}", c.emoji, c.name).trim().to_string(),
                value: c.name,
                description: Some(c.description),
            })
            .collect();

        OutgoingMessage::embed(
            EmbedContent::new(
                "Need help? Pick a category below and a private ticket will be opened for you.",
                COLOR_INFO,
            )
            .title("🎫 Support tickets")
            .footer(config.footer.clone()),
        )
        .with_select(SelectContent {
            action: ComponentAction::TicketOpen,
            placeholder: "Choose a category".to_string(),
            options,
        })
    }

    pub async fn add_category(&self, guild: GuildId, category: TicketCategory) -> Result<()> {
        let name = category.name.trim().to_string();
        if name.is_empty() {
            return Err(BotError::validation("Category name cannot be empty."));
        }
        self.store
            .update(&guild.to_string(), |t| {
                if t.config.categories.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
                    return Err(BotError::validation(format!(
                        "Category '{}' already exists.",
                        name
                    )));
                }
                // The first custom category replaces the built-in defaults
                t.config.categories.push(TicketCategory { name, ..category });
                Ok(())
            })
            .await?
    }

    pub async fn delete_category(&self, guild: GuildId, name: &str) -> Result<()> {
        let removed = self
            .store
            .update(&guild.to_string(), |t| {
                let before = t.config.categories.len();
                t.config.categories.retain(|c| !c.name.eq_ignore_ascii_case(name));
                before != t.config.categories.len()
            })
            .await?;
        if removed {
            Ok(())
        } else {
            Err(BotError::NotFound {
                what: format!("ticket category '{}'", name),
            })
        }
    }

    /// Rename a category or change its description or emoji
    pub async fn edit_category(
        &self,
        guild: GuildId,
        name: &str,
        new_name: Option<String>,
        description: Option<String>,
        emoji: Option<String>,
    ) -> Result<()> {
        let new_name = new_name.map(|n| n.trim().to_string());
        if new_name.as_deref().is_some_and(str::is_empty) {
            return Err(BotError::validation("Category name cannot be empty."));
        }
        self.store
            .update(&guild.to_string(), |t| {
                let categories = &mut t.config.categories;
                let Some(index) = categories
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
                else {
                    return Err(BotError::NotFound {
                        what: format!("ticket category '{}'", name),
                    });
                };
                if let Some(new_name) = &new_name {
                    let taken = categories
                        .iter()
                        .enumerate()
                        .any(|(i, c)| i != index && c.name.eq_ignore_ascii_case(new_name));
                    if taken {
                        return Err(BotError::validation(format!(
                            "Category '{}' already exists.",
                            new_name
                        )));
                    }
                }

                let category = &mut categories[index];
                if let Some(new_name) = new_name {
                    category.name = new_name;
                }
                if let Some(description) = description {
                    category.description = description;
                }
                if let Some(emoji) = emoji {
                    category.emoji = emoji;
                }
                Ok(())
            })
            .await?
    }

    pub async fn set_ping_role(&self, guild: GuildId, role: Option<RoleId>) -> Result<()> {
        self.store
            .update(&guild.to_string(), |t| {
                t.config.ping_role = role.map(|r| r.to_string())
            })
            .await
    }

    pub async fn set_footer(&self, guild: GuildId, footer: &str) -> Result<()> {
        self.store
            .update(&guild.to_string(), |t| t.config.footer = footer.to_string())
            .await
    }

    pub async fn set_transcript_channel(&self, guild: GuildId, channel: Option<ChannelId>) -> Result<()> {
        self.store
            .update(&guild.to_string(), |t| {
                t.config.transcript_channel = channel.map(|c| c.to_string())
            })
            .await
    }
}

fn not_a_ticket() -> BotError {
    BotError::NotFound {
        what: "ticket for this channel".to_string(),
    }
}

fn opening_message(config: &TicketConfig, category: &TicketCategory, opener: UserId) -> OutgoingMessage {
    let mut content = mention_user(opener);
    if let Some(role) = config.ping_role_id() {
        content = format!("{} {}", content, mention_role(role));
    }

    OutgoingMessage::embed(
        EmbedContent::new(
            ticket_opened_message(&mention_user(opener), &category.name),
            COLOR_INFO,
        )
        .title(format!("{} {} ticket", category.emoji, category.name).trim().to_string())
        .footer(config.footer.clone())
        .timestamped(),
    )
    .with_content(content)
    .with_button(ComponentAction::TicketClaim, "Claim", ButtonTone::Success)
    .with_button(ComponentAction::TicketClose, "Close", ButtonTone::Danger)
    .with_button(ComponentAction::TicketTranscript, "Transcript", ButtonTone::Secondary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use crate::platform::HistoryMessage;
    use crate::state::{open_shared_store, TicketState};
    use chrono::Duration;

    const GUILD: GuildId = GuildId::new(1);
    const OPENER: UserId = UserId::new(7);
    const STAFF: UserId = UserId::new(8);

    async fn manager(dir: &tempfile::TempDir) -> TicketManager {
        let tickets = open_shared_store(&dir.path().join("tickets.json").to_string_lossy())
            .await
            .unwrap();
        let logs = open_shared_store(&dir.path().join("logs_config.json").to_string_lossy())
            .await
            .unwrap();
        TicketManager::new(tickets, logs, Duration::hours(24), 100)
    }

    fn staff() -> Actor {
        Actor {
            id: STAFF,
            can_manage: true,
        }
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(ticket_channel_name("Alice"), "ticket-alice");
        assert_eq!(ticket_channel_name("big bob!"), "ticket-big-bob");
        assert_eq!(ticket_channel_name("!!"), "ticket-user");
    }

    #[tokio::test]
    async fn test_create_makes_one_channel_record_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();

        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "support", Utc::now())
            .await
            .unwrap();

        let created = platform.created_channels();
        assert_eq!(created.len(), 1);
        let (channel, request) = &created[0];
        assert_eq!(request.name, "ticket-alice");
        assert!(request
            .access
            .iter()
            .any(|r| r.target == AccessTarget::Everyone && r.deny.contains(Permissions::VIEW_CHANNEL)));

        assert_eq!(record.id, channel.to_string());
        assert_eq!(record.state, TicketState::Open);
        assert_eq!(record.category, "Support");
        let stored = tickets.store.get("1").await;
        assert_eq!(stored.tickets.len(), 1);
        assert_eq!(stored.tickets[&channel.to_string()].state, TicketState::Open);

        let posted = platform.messages_in(*channel);
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].buttons.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();

        let result = tickets
            .create(&platform, GUILD, OPENER, "alice", "billing", Utc::now())
            .await;
        assert!(matches!(result, Err(BotError::Validation { .. })));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_claim_twice_is_reported_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Bug", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());

        let claimed = tickets.claim(&platform, GUILD, channel, staff()).await.unwrap();
        assert_eq!(claimed.state, TicketState::Claimed);

        let other = Actor {
            id: UserId::new(9),
            can_manage: true,
        };
        let again = tickets.claim(&platform, GUILD, channel, other).await;
        assert!(matches!(again, Err(BotError::Validation { .. })));
        let stored = tickets.ticket(GUILD, channel).await.unwrap();
        assert_eq!(stored.claimed_by.as_deref(), Some("8"));
    }

    #[tokio::test]
    async fn test_claim_requires_manage_channels() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Other", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());

        let member = Actor {
            id: OPENER,
            can_manage: false,
        };
        let result = tickets.claim(&platform, GUILD, channel, member).await;
        assert!(matches!(result, Err(BotError::PermissionDenied { .. })));
        assert_eq!(
            tickets.ticket(GUILD, channel).await.unwrap().state,
            TicketState::Open
        );
    }

    #[tokio::test]
    async fn test_close_then_sweep_after_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let opened_at = Utc::now();
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", opened_at)
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());

        let closed_at = opened_at + Duration::minutes(5);
        let closed = tickets
            .close(&platform, GUILD, channel, staff(), closed_at)
            .await
            .unwrap();
        assert_eq!(closed.state, TicketState::Closed);
        assert_eq!(closed.closed_at, Some(closed_at));
        assert_eq!(platform.channel_name(channel).as_deref(), Some("closed-ticket-alice"));

        // Not yet due
        assert_eq!(tickets.sweep(&platform, closed_at + Duration::hours(23)).await, 0);
        assert!(platform.channel_exists(channel));

        assert_eq!(tickets.sweep(&platform, closed_at + Duration::hours(24)).await, 1);
        assert!(!platform.channel_exists(channel));
        assert!(tickets.ticket(GUILD, channel).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_drops_record_of_vanished_channel_but_keeps_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let now = Utc::now();
        let first = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", now)
            .await
            .unwrap();
        let first_channel = ChannelId::new(first.id.parse().unwrap());
        tickets
            .close(&platform, GUILD, first_channel, staff(), now)
            .await
            .unwrap();

        let later = now + Duration::days(2);
        platform.fail_deletes(true);
        assert_eq!(tickets.sweep(&platform, later).await, 0);
        assert!(tickets.ticket(GUILD, first_channel).await.is_some());

        platform.fail_deletes(false);
        platform.drop_channel(first_channel);
        assert_eq!(tickets.sweep(&platform, later).await, 1);
        assert!(tickets.ticket(GUILD, first_channel).await.is_none());
    }

    #[tokio::test]
    async fn test_transcript_goes_to_closer_dm_without_transcript_channel() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let now = Utc::now();
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", now)
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());
        platform.set_history(
            channel,
            vec![
                HistoryMessage {
                    author_id: UserId::new(999),
                    author_name: "bot".to_string(),
                    author_bot: true,
                    content: "welcome".to_string(),
                    timestamp: now,
                },
                HistoryMessage {
                    author_id: OPENER,
                    author_name: "alice".to_string(),
                    author_bot: false,
                    content: "my game crashes".to_string(),
                    timestamp: now,
                },
            ],
        );

        tickets
            .close(&platform, GUILD, channel, staff(), now)
            .await
            .unwrap();
        let dms = platform.direct_messages_to(STAFF);
        assert_eq!(dms.len(), 1);
        let attachment = dms[0].attachment.as_ref().unwrap();
        let text = String::from_utf8(attachment.data.clone()).unwrap();
        assert!(text.contains("alice: my game crashes"));
        assert!(!text.contains("welcome"));
    }

    #[tokio::test]
    async fn test_close_survives_dm_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        platform.fail_direct_messages(true);
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());

        let closed = tickets.close(&platform, GUILD, channel, staff(), Utc::now()).await;
        assert!(closed.is_ok());
        let again = tickets.close(&platform, GUILD, channel, staff(), Utc::now()).await;
        assert!(matches!(again, Err(BotError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_transcript_channel_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        let archive = ChannelId::new(77);
        tickets
            .set_transcript_channel(GUILD, Some(archive))
            .await
            .unwrap();
        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());

        tickets
            .close(&platform, GUILD, channel, staff(), Utc::now())
            .await
            .unwrap();
        assert_eq!(platform.messages_in(archive).len(), 1);
        assert!(platform.direct_messages_to(STAFF).is_empty());
    }

    #[tokio::test]
    async fn test_custom_categories_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        tickets
            .add_category(
                GUILD,
                TicketCategory {
                    name: "Partnership".to_string(),
                    description: "Partner requests".to_string(),
                    emoji: "🤝".to_string(),
                },
            )
            .await
            .unwrap();

        let panel = tickets.panel_message(GUILD).await;
        let select = panel.select.unwrap();
        assert_eq!(select.options.len(), 1);
        assert_eq!(select.options[0].value, "Partnership");

        tickets
            .edit_category(GUILD, "partnership", None, None, Some("🤗".to_string()))
            .await
            .unwrap();
        assert_eq!(tickets.config(GUILD).await.categories[0].emoji, "🤗");

        tickets
            .add_category(
                GUILD,
                TicketCategory {
                    name: "Billing".to_string(),
                    description: String::new(),
                    emoji: String::new(),
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            tickets
                .edit_category(GUILD, "Partnership", Some("billing".to_string()), None, None)
                .await,
            Err(BotError::Validation { .. })
        ));
        assert!(matches!(
            tickets
                .edit_category(GUILD, "Partnership", Some("  ".to_string()), None, None)
                .await,
            Err(BotError::Validation { .. })
        ));
        tickets
            .edit_category(GUILD, "Partnership", Some(" Partners ".to_string()), None, None)
            .await
            .unwrap();
        let categories = tickets.config(GUILD).await.categories;
        assert_eq!(categories[0].name, "Partners");
        assert_eq!(categories[0].emoji, "🤗");
        assert!(matches!(
            tickets
                .edit_category(GUILD, "Partnership", None, Some("x".to_string()), None)
                .await,
            Err(BotError::NotFound { .. })
        ));

        tickets.delete_category(GUILD, "Partners").await.unwrap();
        tickets.delete_category(GUILD, "Billing").await.unwrap();
        assert!(matches!(
            tickets.delete_category(GUILD, "Partners").await,
            Err(BotError::NotFound { .. })
        ));
        assert_eq!(tickets.config(GUILD).await.effective_categories().len(), 3);
    }

    #[tokio::test]
    async fn test_ping_role_gets_access_and_mention() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = manager(&dir).await;
        let platform = FakePlatform::new();
        tickets
            .set_ping_role(GUILD, Some(RoleId::new(55)))
            .await
            .unwrap();

        let record = tickets
            .create(&platform, GUILD, OPENER, "alice", "Support", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());
        let (_, request) = &platform.created_channels()[0];
        assert!(request
            .access
            .iter()
            .any(|r| r.target == AccessTarget::Role(RoleId::new(55))));
        let posted = platform.messages_in(channel);
        assert_eq!(posted[0].content.as_deref(), Some("<@7> <@&55>"));
        assert!(platform
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::DeleteChannel { .. })));
    }
}
