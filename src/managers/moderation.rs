use chrono::{DateTime, Duration, Utc};
use poise::serenity_prelude::{GuildId, UserId};
use tracing::{debug, info, warn};

use crate::config::guild::parse_id;
use crate::config::{LogKind, LogsConfig};
use crate::duration::{format_seconds, parse_positive};
use crate::error::{BotError, Result};
use crate::managers::event_log::post_log;
use crate::messages::{moderation_dm, COLOR_DANGER, COLOR_SUCCESS, COLOR_WARNING};
use crate::platform::{mention_user, EmbedContent, OutgoingMessage, Platform};
use crate::state::{ModerationLog, SanctionEntry, SharedStore, WarnEntry};

pub const MIN_REASON_CHARS: usize = 5;
pub const MODLOG_LIMIT: usize = 10;

/// Discord refuses timeouts longer than 28 days
pub fn max_mute() -> Duration {
    Duration::days(28)
}

/// Who sanctions whom, and why
#[derive(Debug, Clone)]
pub struct ModRequest {
    pub guild: GuildId,
    pub guild_name: String,
    pub moderator: UserId,
    pub target: UserId,
    pub reason: String,
}

pub struct ModerationManager {
    store: SharedStore<ModerationLog>,
    logs: SharedStore<LogsConfig>,
}

impl ModerationManager {
    pub fn new(store: SharedStore<ModerationLog>, logs: SharedStore<LogsConfig>) -> Self {
        Self { store, logs }
    }

    /// Shared checks, in order: self-target, reason length, administrator target.
    ///
    /// Returns the trimmed reason.
    async fn check(&self, platform: &dyn Platform, request: &ModRequest, require_member: bool) -> Result<String> {
        if request.moderator == request.target {
            return Err(BotError::validation("You cannot use this command on yourself."));
        }
        let reason = request.reason.trim();
        if reason.chars().count() < MIN_REASON_CHARS {
            return Err(BotError::validation(format!(
                "Please give a reason of at least {} characters.",
                MIN_REASON_CHARS
            )));
        }
        match platform.member(request.guild, request.target).await? {
            Some(member) if member.is_admin => Err(BotError::PermissionDenied {
                message: "administrators cannot be sanctioned".to_string(),
            }),
            None if require_member => Err(BotError::MemberNotFound {
                id: request.target.to_string(),
            }),
            _ => Ok(reason.to_string()),
        }
    }

    /// Best-effort DM; a closed inbox never blocks the sanction
    async fn notify(&self, platform: &dyn Platform, request: &ModRequest, action: &str, reason: &str) {
        let text = moderation_dm(action, &request.guild_name, reason);
        if let Err(e) = platform
            .send_direct_message(request.target, OutgoingMessage::text(text))
            .await
        {
            debug!("Could not DM {} about {}: {}", request.target, action, e);
        }
    }

    async fn log(&self, platform: &dyn Platform, request: &ModRequest, action: &str, reason: &str, extra: Option<String>, color: u32) {
        let mut embed = EmbedContent::new(
            format!(
                "**{}** {} by {}",
                action,
                mention_user(request.target),
                mention_user(request.moderator)
            ),
            color,
        )
        .field("Reason", reason, false);
        if let Some(extra) = extra {
            embed = embed.field("Duration", extra, true);
        }
        post_log(platform, &self.logs, request.guild, LogKind::Moderation, embed).await;
    }

    /// Ban, permanently or until `duration` has elapsed
    pub async fn ban(
        &self,
        platform: &dyn Platform,
        request: ModRequest,
        duration: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SanctionEntry> {
        let reason = self.check(platform, &request, false).await?;
        let duration = match duration {
            Some(raw) => Some(parse_positive(raw).ok_or_else(|| {
                BotError::validation("Invalid duration. Use a format like `7d` or `12h`.")
            })?),
            None => None,
        };
        let expires_at = duration.and_then(|d| now.checked_add_signed(d));

        self.notify(platform, &request, "banned", &reason).await;
        platform
            .ban_member(request.guild, request.target, &reason)
            .await?;

        let entry = SanctionEntry {
            moderator: request.moderator.to_string(),
            reason: reason.clone(),
            timestamp: now,
            expires_at,
        };
        let stored = entry.clone();
        self.store
            .update(&request.guild.to_string(), |log| {
                log.bans.insert(request.target.to_string(), stored)
            })
            .await?;
        info!(
            "User {} banned from guild {} by {}",
            request.target, request.guild, request.moderator
        );

        let extra = duration.map(|d| format_seconds(d.num_seconds().max(0) as u64));
        self.log(platform, &request, "Ban", &reason, extra, COLOR_DANGER).await;
        Ok(entry)
    }

    pub async fn unban(&self, platform: &dyn Platform, guild: GuildId, moderator: UserId, target: UserId) -> Result<()> {
        platform.unban_member(guild, target).await?;
        self.store
            .update(&guild.to_string(), |log| log.bans.remove(&target.to_string()))
            .await?;
        info!("User {} unbanned from guild {} by {}", target, guild, moderator);

        let embed = EmbedContent::new(
            format!("**Unban** {} by {}", mention_user(target), mention_user(moderator)),
            COLOR_SUCCESS,
        );
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
        Ok(())
    }

    pub async fn kick(&self, platform: &dyn Platform, request: ModRequest) -> Result<()> {
        let reason = self.check(platform, &request, true).await?;
        self.notify(platform, &request, "kicked", &reason).await;
        platform
            .kick_member(request.guild, request.target, &reason)
            .await?;
        info!(
            "User {} kicked from guild {} by {}",
            request.target, request.guild, request.moderator
        );
        self.log(platform, &request, "Kick", &reason, None, COLOR_DANGER).await;
        Ok(())
    }

    /// Timeout for 1s up to 28 days
    pub async fn mute(
        &self,
        platform: &dyn Platform,
        request: ModRequest,
        duration: &str,
        now: DateTime<Utc>,
    ) -> Result<SanctionEntry> {
        let reason = self.check(platform, &request, true).await?;
        let duration = parse_positive(duration)
            .filter(|d| *d <= max_mute())
            .ok_or_else(|| {
                BotError::validation("The mute duration must be between 1s and 28d (e.g. `10m`, `2h`).")
            })?;
        let until = now + duration;

        platform
            .timeout_member(request.guild, request.target, Some(until), &reason)
            .await?;
        self.notify(platform, &request, "muted", &reason).await;

        let entry = SanctionEntry {
            moderator: request.moderator.to_string(),
            reason: reason.clone(),
            timestamp: now,
            expires_at: Some(until),
        };
        let stored = entry.clone();
        self.store
            .update(&request.guild.to_string(), |log| {
                log.mutes.insert(request.target.to_string(), stored)
            })
            .await?;
        info!(
            "User {} muted in guild {} until {}",
            request.target, request.guild, until
        );

        let extra = Some(format_seconds(duration.num_seconds().max(0) as u64));
        self.log(platform, &request, "Mute", &reason, extra, COLOR_WARNING).await;
        Ok(entry)
    }

    pub async fn unmute(&self, platform: &dyn Platform, guild: GuildId, moderator: UserId, target: UserId) -> Result<()> {
        platform
            .timeout_member(guild, target, None, "Mute lifted")
            .await?;
        self.store
            .update(&guild.to_string(), |log| log.mutes.remove(&target.to_string()))
            .await?;

        let embed = EmbedContent::new(
            format!("**Unmute** {} by {}", mention_user(target), mention_user(moderator)),
            COLOR_SUCCESS,
        );
        post_log(platform, &self.logs, guild, LogKind::Moderation, embed).await;
        Ok(())
    }

    /// Record a warning; returns the user's warn count
    pub async fn warn(&self, platform: &dyn Platform, request: ModRequest, now: DateTime<Utc>) -> Result<usize> {
        let reason = self.check(platform, &request, true).await?;
        self.notify(platform, &request, "warned", &reason).await;

        let entry = WarnEntry {
            moderator: request.moderator.to_string(),
            reason: reason.clone(),
            timestamp: now,
        };
        let count = self
            .store
            .update(&request.guild.to_string(), |log| {
                log.add_warn(&request.target.to_string(), entry)
            })
            .await?;
        info!(
            "User {} warned in guild {} ({} warn(s))",
            request.target, request.guild, count
        );

        self.log(platform, &request, &format!("Warn #{}", count), &reason, None, COLOR_WARNING)
            .await;
        Ok(count)
    }

    /// Latest warns of a user, newest first
    pub async fn modlog(&self, guild: GuildId, target: UserId) -> (usize, Vec<WarnEntry>) {
        let log = self.store.get(&guild.to_string()).await;
        let warns = log.warns_for(&target.to_string());
        let latest = warns.iter().rev().take(MODLOG_LIMIT).cloned().collect();
        (warns.len(), latest)
    }

    /// Lift temporary bans that have expired
    pub async fn sweep_expired_bans(&self, platform: &dyn Platform, now: DateTime<Utc>) -> usize {
        let mut lifted = 0;
        for (guild_id, log) in self.store.snapshot().await {
            let Some(raw) = parse_id(Some(&guild_id)) else {
                continue;
            };
            let guild = GuildId::new(raw);
            for (user, expires_at) in log.expired_bans(now) {
                let Some(user_raw) = parse_id(Some(&user)) else {
                    continue;
                };
                match platform.unban_member(guild, UserId::new(user_raw)).await {
                    Ok(()) => info!("Temporary ban of {} in guild {} expired", user, guild),
                    Err(e) if e.is_gone() => debug!("Ban of {} already lifted", user),
                    Err(e) => {
                        warn!("Failed to lift expired ban of {}: {}", user, e);
                        continue;
                    }
                }
                match self
                    .store
                    .update(&guild_id, |log| log.clear_expired_ban(&user, expires_at))
                    .await
                {
                    Ok(true) => lifted += 1,
                    Ok(false) => debug!("Ban of {} was renewed while being lifted", user),
                    Err(e) => warn!("Failed to clear expired ban of {}: {}", user, e),
                }
            }
        }
        lifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use crate::state::open_shared_store;

    const GUILD: GuildId = GuildId::new(1);
    const MODERATOR: UserId = UserId::new(2);
    const TARGET: UserId = UserId::new(3);

    async fn manager(dir: &tempfile::TempDir) -> ModerationManager {
        let store = open_shared_store(&dir.path().join("moderation.json").to_string_lossy())
            .await
            .unwrap();
        let logs = open_shared_store(&dir.path().join("logs_config.json").to_string_lossy())
            .await
            .unwrap();
        ModerationManager::new(store, logs)
    }

    fn request(target: UserId, reason: &str) -> ModRequest {
        ModRequest {
            guild: GUILD,
            guild_name: "Test server".to_string(),
            moderator: MODERATOR,
            target,
            reason: reason.to_string(),
        }
    }

    fn platform() -> FakePlatform {
        FakePlatform::new()
            .with_member(2, "mod", false)
            .with_member(3, "target", false)
            .with_member(4, "admin", true)
    }

    #[tokio::test]
    async fn test_self_target_rejected_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();

        let result = moderation
            .ban(&platform, request(MODERATOR, "testing myself"), None, Utc::now())
            .await;
        assert!(matches!(result, Err(BotError::Validation { .. })));
        let result = moderation
            .warn(&platform, request(MODERATOR, "testing myself"), Utc::now())
            .await;
        assert!(matches!(result, Err(BotError::Validation { .. })));
        let result = moderation
            .kick(&platform, request(MODERATOR, "testing myself"))
            .await;
        assert!(matches!(result, Err(BotError::Validation { .. })));
        let result = moderation
            .mute(&platform, request(MODERATOR, "testing myself"), "10m", Utc::now())
            .await;
        assert!(matches!(result, Err(BotError::Validation { .. })));

        assert!(platform.calls().is_empty());
        assert!(moderation.store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_short_reason_and_admin_target() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();

        let short = moderation
            .kick(&platform, request(TARGET, "  spa  "))
            .await;
        assert!(matches!(short, Err(BotError::Validation { .. })));

        let admin = moderation
            .kick(&platform, request(UserId::new(4), "abusing power"))
            .await;
        assert!(matches!(admin, Err(BotError::PermissionDenied { .. })));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ban_dms_first_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();
        let now = Utc::now();

        moderation
            .ban(&platform, request(TARGET, "spamming links"), None, now)
            .await
            .unwrap();
        let calls = platform.calls();
        assert!(matches!(calls[0], Call::SendDirectMessage { user, .. } if user == TARGET));
        assert!(matches!(calls[1], Call::Ban { user, .. } if user == TARGET));

        moderation
            .ban(&platform, request(TARGET, "ban evasion"), Some("1d"), now)
            .await
            .unwrap();
        let log = moderation.store.get("1").await;
        assert_eq!(log.bans.len(), 1);
        assert_eq!(log.bans["3"].reason, "ban evasion");
        assert_eq!(log.bans["3"].expires_at, Some(now + Duration::days(1)));
    }

    #[tokio::test]
    async fn test_ban_goes_through_when_dm_fails() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();
        platform.fail_direct_messages(true);

        moderation
            .ban(&platform, request(TARGET, "raiding the server"), None, Utc::now())
            .await
            .unwrap();
        assert!(platform
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Ban { user, .. } if *user == TARGET)));
    }

    #[tokio::test]
    async fn test_mute_duration_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();
        let now = Utc::now();

        for bad in ["", "nope", "29d"] {
            let result = moderation
                .mute(&platform, request(TARGET, "flooding chat"), bad, now)
                .await;
            assert!(matches!(result, Err(BotError::Validation { .. })), "{}", bad);
        }
        assert!(platform.calls().is_empty());

        let entry = moderation
            .mute(&platform, request(TARGET, "flooding chat"), "28d", now)
            .await
            .unwrap();
        assert_eq!(entry.expires_at, Some(now + Duration::days(28)));
        assert!(platform.calls().iter().any(
            |c| matches!(c, Call::Timeout { user, until } if *user == TARGET && until.is_some())
        ));
    }

    #[tokio::test]
    async fn test_warns_accumulate_and_modlog_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();

        for n in 1..=12 {
            let count = moderation
                .warn(&platform, request(TARGET, &format!("warning number {}", n)), Utc::now())
                .await
                .unwrap();
            assert_eq!(count, n);
        }
        let (total, latest) = moderation.modlog(GUILD, TARGET).await;
        assert_eq!(total, 12);
        assert_eq!(latest.len(), MODLOG_LIMIT);
        assert_eq!(latest[0].reason, "warning number 12");
    }

    #[tokio::test]
    async fn test_kick_requires_membership() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();

        let result = moderation
            .kick(&platform, request(UserId::new(50), "not here anymore"))
            .await;
        assert!(matches!(result, Err(BotError::MemberNotFound { .. })));
    }

    #[tokio::test]
    async fn test_expired_temp_bans_are_lifted() {
        let dir = tempfile::tempdir().unwrap();
        let moderation = manager(&dir).await;
        let platform = platform();
        let now = Utc::now();

        moderation
            .ban(&platform, request(TARGET, "cooling off"), Some("1h"), now)
            .await
            .unwrap();
        assert_eq!(moderation.sweep_expired_bans(&platform, now).await, 0);
        assert_eq!(
            moderation
                .sweep_expired_bans(&platform, now + Duration::hours(1))
                .await,
            1
        );
        assert!(platform
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Unban { user } if *user == TARGET)));
        assert!(moderation.store.get("1").await.bans.is_empty());
    }
}
