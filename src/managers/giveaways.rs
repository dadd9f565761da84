use chrono::{DateTime, Utc};
use futures::future::join_all;
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::components::ComponentAction;
use crate::config::guild::parse_id;
use crate::duration::parse_positive;
use crate::error::{BotError, Result};
use crate::messages::{COLOR_GIVEAWAY, COLOR_WARNING};
use crate::platform::{mention_user, ButtonTone, EmbedContent, OutgoingMessage, Platform};
use crate::state::{GiveawayRecord, GuildGiveaways, JoinOutcome, SharedStore};

pub const MAX_WINNERS: u32 = 50;
const LIST_LIMIT: usize = 10;

/// Parameters of `/giveaway create`
#[derive(Debug, Clone)]
pub struct NewGiveaway {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub winners: u32,
    pub channel: ChannelId,
    pub host: UserId,
}

/// Draw up to `count` distinct entries uniformly at random
pub fn draw_winners<R: Rng + ?Sized>(eligible: &[String], count: u32, rng: &mut R) -> Vec<String> {
    eligible
        .choose_multiple(rng, count as usize)
        .cloned()
        .collect()
}

fn giveaway_embed(record: &GiveawayRecord) -> EmbedContent {
    EmbedContent::new(
        format!(
            "{}\n\n🏆 **Winners:** {}\n⏰ **Ends:** <t:{}:R>\n👤 **Host:** <@{}>",
            record.description, record.winners, record.end_time, record.host_id
        ),
        COLOR_GIVEAWAY,
    )
    .title(format!("🎉 {}", record.title))
    .footer(format!("Giveaway ID: {}", record.id))
}

fn mentions(winners: &[String]) -> String {
    winners
        .iter()
        .map(|w| format!("<@{}>", w))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_channel(raw: &str) -> Result<ChannelId> {
    parse_id(Some(raw))
        .map(ChannelId::new)
        .ok_or_else(|| BotError::Internal {
            message: format!("invalid giveaway channel id '{}'", raw),
        })
}

pub struct GiveawayManager {
    store: SharedStore<GuildGiveaways>,
}

impl GiveawayManager {
    pub fn new(store: SharedStore<GuildGiveaways>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        giveaway: NewGiveaway,
        now: DateTime<Utc>,
    ) -> Result<GiveawayRecord> {
        let duration = parse_positive(&giveaway.duration).ok_or_else(|| {
            BotError::validation("Invalid duration. Use a format like `1d`, `2h30m` or `45s`.")
        })?;
        if giveaway.winners == 0 || giveaway.winners > MAX_WINNERS {
            return Err(BotError::validation(format!(
                "The number of winners must be between 1 and {}.",
                MAX_WINNERS
            )));
        }
        let end_time = now
            .checked_add_signed(duration)
            .ok_or_else(|| BotError::validation("That duration is too long."))?
            .timestamp();

        // Reserve the id before posting so the join button can carry it
        let record = self
            .store
            .update(&guild.to_string(), |g| {
                let record = GiveawayRecord {
                    id: g.next_id(end_time),
                    title: giveaway.title,
                    description: giveaway.description,
                    end_time,
                    winners: giveaway.winners,
                    channel_id: giveaway.channel.to_string(),
                    message_id: None,
                    host_id: giveaway.host.to_string(),
                    participants: Vec::new(),
                    ended: false,
                    drawn_winners: Vec::new(),
                };
                g.giveaways.insert(record.id.clone(), record.clone());
                record
            })
            .await?;

        let message = OutgoingMessage::embed(giveaway_embed(&record)).with_button(
            ComponentAction::GiveawayJoin {
                giveaway_id: record.id.clone(),
            },
            "🎉 Join",
            ButtonTone::Primary,
        );
        let message_id = match platform.send_message(giveaway.channel, message).await {
            Ok(id) => id,
            Err(e) => {
                self.store
                    .update(&guild.to_string(), |g| g.giveaways.remove(&record.id))
                    .await?;
                return Err(e);
            }
        };

        let record = self
            .store
            .update(&guild.to_string(), |g| {
                g.giveaways.get_mut(&record.id).map(|r| {
                    r.message_id = Some(message_id.to_string());
                    r.clone()
                })
            })
            .await?
            .unwrap_or(record);
        info!(
            "Created giveaway {} '{}' in guild {} ({} winner(s))",
            record.id, record.title, guild, record.winners
        );
        Ok(record)
    }

    pub async fn join(&self, guild: GuildId, id: &str, user: UserId) -> Result<JoinOutcome> {
        let outcome = self
            .store
            .update(&guild.to_string(), |g| {
                g.giveaways.get_mut(id).map(|r| r.join(&user.to_string()))
            })
            .await?;
        match outcome {
            Some(outcome) => {
                debug!("Join on giveaway {} by {}: {:?}", id, user, outcome);
                Ok(outcome)
            }
            None => Err(BotError::NotFound {
                what: "giveaway (it no longer exists)".to_string(),
            }),
        }
    }

    /// Participants still in the guild
    async fn eligible(&self, platform: &dyn Platform, guild: GuildId, participants: &[String]) -> Vec<String> {
        let lookups = participants.iter().map(|p| async move {
            let user = parse_id(Some(p))?;
            match platform.member(guild, UserId::new(user)).await {
                Ok(Some(member)) if !member.is_bot => Some(p.clone()),
                Ok(_) => None,
                Err(e) => {
                    warn!("Member lookup for giveaway participant {} failed: {}", p, e);
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Draw and store winners for an ended giveaway, then announce them
    async fn draw_and_announce(
        &self,
        platform: &dyn Platform,
        guild: GuildId,
        record: &GiveawayRecord,
        reroll: bool,
    ) -> Result<Vec<String>> {
        let eligible = self.eligible(platform, guild, &record.participants).await;
        let winners = {
            let mut rng = rand::rng();
            draw_winners(&eligible, record.winners, &mut rng)
        };

        let stored = winners.clone();
        self.store
            .update(&guild.to_string(), |g| {
                if let Some(r) = g.giveaways.get_mut(&record.id) {
                    r.drawn_winners = stored;
                }
            })
            .await?;

        let description = if winners.is_empty() {
            format!(
                "No valid participants for **{}**, so there is no winner.",
                record.title
            )
        } else if reroll {
            format!(
                "🔁 New draw for **{}**! Congratulations {}!",
                record.title,
                mentions(&winners)
            )
        } else {
            format!(
                "🎉 Congratulations {}! You won **{}**!",
                mentions(&winners),
                record.title
            )
        };
        let color = if winners.is_empty() {
            COLOR_WARNING
        } else {
            COLOR_GIVEAWAY
        };
        let channel = parse_channel(&record.channel_id)?;
        platform
            .send_message(
                channel,
                OutgoingMessage::embed(
                    EmbedContent::new(description, color)
                        .footer(format!("Giveaway ID: {}", record.id)),
                )
                .with_content(mentions(&winners)),
            )
            .await?;

        info!(
            "Giveaway {} in guild {} drew {} winner(s) from {} eligible",
            record.id,
            guild,
            winners.len(),
            eligible.len()
        );
        Ok(winners)
    }

    /// Flip `ended` and draw; None when the giveaway is unknown
    async fn resolve(&self, platform: &dyn Platform, guild: GuildId, id: &str) -> Result<Option<Vec<String>>> {
        let flipped = self
            .store
            .update(&guild.to_string(), |g| {
                g.giveaways.get_mut(id).map(|r| {
                    let was_ended = r.ended;
                    r.ended = true;
                    (was_ended, r.clone())
                })
            })
            .await?;
        match flipped {
            None => Ok(None),
            Some((true, _)) => Err(BotError::validation("This giveaway has already ended.")),
            Some((false, record)) => self
                .draw_and_announce(platform, guild, &record, false)
                .await
                .map(Some),
        }
    }

    /// Force a running giveaway to end now
    pub async fn end(&self, platform: &dyn Platform, guild: GuildId, id: &str) -> Result<Vec<String>> {
        self.resolve(platform, guild, id)
            .await?
            .ok_or_else(|| BotError::NotFound {
                what: format!("giveaway '{}'", id),
            })
    }

    pub async fn reroll(&self, platform: &dyn Platform, guild: GuildId, id: &str) -> Result<Vec<String>> {
        let record = self
            .store
            .get(&guild.to_string())
            .await
            .giveaways
            .get(id)
            .cloned()
            .ok_or_else(|| BotError::NotFound {
                what: format!("giveaway '{}'", id),
            })?;
        if !record.ended {
            return Err(BotError::validation(
                "This giveaway is still running. End it before rerolling.",
            ));
        }
        self.draw_and_announce(platform, guild, &record, true).await
    }

    /// Most recent giveaways first
    pub async fn list(&self, guild: GuildId) -> Vec<GiveawayRecord> {
        let mut giveaways: Vec<GiveawayRecord> = self
            .store
            .get(&guild.to_string())
            .await
            .giveaways
            .into_values()
            .collect();
        giveaways.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        giveaways.truncate(LIST_LIMIT);
        giveaways
    }

    /// Resolve every running giveaway whose end time has passed
    pub async fn sweep(&self, platform: &dyn Platform, now: DateTime<Utc>) -> usize {
        let mut resolved = 0;
        for (guild_id, guild) in self.store.snapshot().await {
            let Some(raw) = parse_id(Some(&guild_id)) else {
                continue;
            };
            let guild_key = GuildId::new(raw);
            for id in guild.due(now) {
                match self.resolve(platform, guild_key, &id).await {
                    Ok(Some(_)) => resolved += 1,
                    Ok(None) => {}
                    Err(e) => warn!("Failed to resolve giveaway {} in guild {}: {}", id, guild_id, e),
                }
            }
        }
        resolved
    }
}
