use poise::serenity_prelude as serenity;
use poise::ChoiceParameter;
use tracing::info;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::managers::GuildStats;
use crate::messages::{help_message, status_message, COLOR_INFO};
use crate::platform::{EmbedContent, OutgoingMessage, Platform};
use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    let latency = ctx.ping().await;
    reply_ephemeral(
        ctx,
        format!("🏓 Pong! Gateway latency: {} ms", latency.as_millis()),
    )
    .await
}

/// Show help information
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    reply_embed(
        ctx,
        EmbedContent::new(help_message(), COLOR_INFO).title("Bot commands"),
        true,
    )
    .await
}

/// Server statistics
#[poise::command(slash_command, guild_only)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let mut stats = {
        let guild = ctx.guild().ok_or("Server is not cached yet, try again shortly")?;
        GuildStats {
            name: guild.name.clone(),
            members: guild.member_count,
            bots: guild.members.values().filter(|m| m.user.bot).count() as u64,
            channels: guild.channels.len(),
            roles: guild.roles.len(),
            icon_url: guild.icon_url(),
            ..Default::default()
        }
    };
    stats.latency = Some(ctx.ping().await);
    stats.uptime = ctx.data().started_at.elapsed();

    reply_embed(ctx, stats.embed(), false).await
}

/// Post a message in a channel as the bot
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn say(
    ctx: Context<'_>,
    #[description = "Where to post"]
    #[channel_types("Text", "News")]
    channel: serenity::GuildChannel,
    #[description = "Message text"] message: String,
) -> Result<(), Error> {
    ctx.data()
        .platform
        .send_message(channel.id, OutgoingMessage::text(message))
        .await?;
    reply_ephemeral(ctx, format!("✅ Message sent in <#{}>.", channel.id)).await
}

/// Send a direct message to a member as the bot
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn say_dm(
    ctx: Context<'_>,
    #[description = "Recipient"] member: serenity::User,
    #[description = "Message text"] message: String,
) -> Result<(), Error> {
    match ctx
        .data()
        .platform
        .send_direct_message(member.id, OutgoingMessage::text(message))
        .await
    {
        Ok(()) => reply_ephemeral(ctx, format!("✅ Message sent to {}.", member.name)).await,
        Err(_) => {
            reply_ephemeral(
                ctx,
                format!("❌ Could not DM {} (their DMs are probably closed).", member.name),
            )
            .await
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum BotStatus {
    #[name = "online"]
    Online,
    #[name = "maintenance"]
    Maintenance,
    #[name = "restart"]
    Restart,
}

/// Announce the bot's status in this channel and update its presence
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn status(
    ctx: Context<'_>,
    #[description = "New status"] status: BotStatus,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let (presence, activity) = match status {
        BotStatus::Online => (serenity::OnlineStatus::Online, "Ready to help"),
        BotStatus::Maintenance => (serenity::OnlineStatus::DoNotDisturb, "Under maintenance"),
        BotStatus::Restart => (serenity::OnlineStatus::Idle, "Restarting"),
    };
    ctx.serenity_context()
        .set_presence(Some(serenity::ActivityData::custom(activity)), presence);
    info!(
        "Status set to {} by {} in guild {}",
        status.name(),
        ctx.author().name,
        guild
    );

    let (text, color) = status_message(status.name());
    reply_embed(ctx, EmbedContent::new(text, color).timestamped(), false).await
}
