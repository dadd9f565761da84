use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::info;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::managers::NewGiveaway;
use crate::messages::COLOR_GIVEAWAY;
use crate::platform::{mention_channel, EmbedContent};
use crate::{Context, Error};

/// Run giveaways
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    subcommands("create", "end", "reroll", "list"),
    subcommand_required
)]
pub async fn giveaway(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Start a giveaway
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Prize"] title: String,
    #[description = "How long it runs, e.g. 1d, 2h30m, 45s"] duration: String,
    #[description = "Number of winners"]
    #[min = 1]
    #[max = 50]
    winners: u32,
    #[description = "Details shown in the announcement"] description: Option<String>,
    #[description = "Where to post (defaults to this channel)"]
    #[channel_types("Text", "News")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let channel = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    info!("Giveaway '{}' created by {} in {}", title, ctx.author().name, guild);

    let record = ctx
        .data()
        .giveaways
        .create(
            ctx.data().platform.as_ref(),
            guild,
            NewGiveaway {
                title,
                description: description.unwrap_or_default(),
                duration,
                winners,
                channel,
                host: ctx.author().id,
            },
            Utc::now(),
        )
        .await?;

    reply_ephemeral(
        ctx,
        format!(
            "🎉 Giveaway `{}` started in {}, ends <t:{}:R>.",
            record.id,
            mention_channel(channel),
            record.end_time
        ),
    )
    .await
}

/// End a running giveaway now
#[poise::command(slash_command, guild_only)]
pub async fn end(
    ctx: Context<'_>,
    #[description = "Giveaway id (see /giveaway list)"] id: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let winners = ctx
        .data()
        .giveaways
        .end(ctx.data().platform.as_ref(), guild, id.trim())
        .await?;
    reply_ephemeral(
        ctx,
        format!("✅ Giveaway `{}` ended with {} winner(s).", id.trim(), winners.len()),
    )
    .await
}

/// Draw new winners for an ended giveaway
#[poise::command(slash_command, guild_only)]
pub async fn reroll(
    ctx: Context<'_>,
    #[description = "Giveaway id (see /giveaway list)"] id: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let winners = ctx
        .data()
        .giveaways
        .reroll(ctx.data().platform.as_ref(), guild, id.trim())
        .await?;
    reply_ephemeral(
        ctx,
        format!("🔄 Giveaway `{}` rerolled, {} new winner(s).", id.trim(), winners.len()),
    )
    .await
}

/// Recent giveaways of this server
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let giveaways = ctx.data().giveaways.list(guild).await;
    if giveaways.is_empty() {
        return reply_ephemeral(ctx, "No giveaways yet.").await;
    }

    let mut embed = EmbedContent::new(String::new(), COLOR_GIVEAWAY).title("🎉 Giveaways");
    for g in &giveaways {
        let status = if g.ended { "ended" } else { "running" };
        embed = embed.field(
            format!("{} ({})", g.title, status),
            format!(
                "ID: `{}`\nEnds: <t:{}:f>\nEntries: {} | Winners: {}",
                g.id,
                g.end_time,
                g.participants.len(),
                g.winners
            ),
            false,
        );
    }
    reply_embed(ctx, embed, true).await
}
