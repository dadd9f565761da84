//! Periodic sweeps driven by persisted state.
//!
//! Each sweep reads deadlines from its store, so work that was due while the
//! bot was offline is picked up on the first tick after a restart.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::Settings;
use crate::managers::{GiveawayManager, ModerationManager, TicketManager};
use crate::platform::Platform;

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

pub fn spawn_ticket_sweeper(
    platform: Arc<dyn Platform>,
    tickets: Arc<TicketManager>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            let removed = tickets.sweep(platform.as_ref(), Utc::now()).await;
            debug!("Ticket sweep done ({} removed)", removed);
        }
    })
}

pub fn spawn_giveaway_sweeper(
    platform: Arc<dyn Platform>,
    giveaways: Arc<GiveawayManager>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            let resolved = giveaways.sweep(platform.as_ref(), Utc::now()).await;
            if resolved > 0 {
                info!("Resolved {} giveaway(s)", resolved);
            }
        }
    })
}

pub fn spawn_ban_sweeper(
    platform: Arc<dyn Platform>,
    moderation: Arc<ModerationManager>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            let lifted = moderation.sweep_expired_bans(platform.as_ref(), Utc::now()).await;
            if lifted > 0 {
                info!("Lifted {} expired ban(s)", lifted);
            }
        }
    })
}

/// Start every sweeper with the configured periods
pub fn spawn_all(
    settings: &Settings,
    platform: Arc<dyn Platform>,
    tickets: Arc<TicketManager>,
    giveaways: Arc<GiveawayManager>,
    moderation: Arc<ModerationManager>,
) -> Vec<JoinHandle<()>> {
    info!(
        "Starting sweepers (tickets every {:?}, giveaways every {:?}, bans every {:?})",
        settings.ticket_sweep_interval, settings.giveaway_sweep_interval, settings.ban_sweep_interval
    );
    vec![
        spawn_ticket_sweeper(platform.clone(), tickets, settings.ticket_sweep_interval),
        spawn_giveaway_sweeper(platform.clone(), giveaways, settings.giveaway_sweep_interval),
        spawn_ban_sweeper(platform, moderation, settings.ban_sweep_interval),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakePlatform;
    use crate::state::open_shared_store;
    use poise::serenity_prelude::{ChannelId, GuildId, UserId};

    #[tokio::test]
    async fn test_ticket_sweeper_runs_on_first_tick() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_shared_store(&dir.path().join("tickets.json").to_string_lossy())
            .await
            .unwrap();
        let logs = open_shared_store(&dir.path().join("logs_config.json").to_string_lossy())
            .await
            .unwrap();
        let tickets = Arc::new(TicketManager::new(store, logs, chrono::Duration::zero(), 100));
        let fake = Arc::new(FakePlatform::new());

        let guild = GuildId::new(1);
        let record = tickets
            .create(fake.as_ref(), guild, UserId::new(7), "alice", "Support", Utc::now())
            .await
            .unwrap();
        let channel = ChannelId::new(record.id.parse().unwrap());
        let staff = crate::managers::Actor {
            id: UserId::new(8),
            can_manage: true,
        };
        tickets
            .close(fake.as_ref(), guild, channel, staff, Utc::now())
            .await
            .unwrap();

        let platform: Arc<dyn Platform> = fake.clone();
        let handle = spawn_ticket_sweeper(platform, tickets.clone(), Duration::from_secs(60));
        for _ in 0..100 {
            if tickets.ticket(guild, channel).await.is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(tickets.ticket(guild, channel).await.is_none());
        assert!(!fake.channel_exists(channel));
    }
}
