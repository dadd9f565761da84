use poise::serenity_prelude as serenity;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::messages::COLOR_INFO;
use crate::platform::{mention_channel, EmbedContent};
use crate::{Context, Error};

/// Give individual members access to a channel
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    default_member_permissions = "MANAGE_CHANNELS",
    subcommands("add", "del", "list"),
    subcommand_required
)]
pub async fn bypass(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Grant a member access to a channel
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Member"] member: serenity::User,
    #[description = "Channel (defaults to this one)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let channel = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    ctx.data()
        .bypass
        .grant(ctx.data().platform.as_ref(), guild, channel, member.id)
        .await?;
    reply_ephemeral(
        ctx,
        format!("✅ {} now has access to {}.", member.name, mention_channel(channel)),
    )
    .await
}

/// Remove a member's access to a channel
#[poise::command(slash_command, guild_only)]
pub async fn del(
    ctx: Context<'_>,
    #[description = "Member"] member: serenity::User,
    #[description = "Channel (defaults to this one)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let channel = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    ctx.data()
        .bypass
        .revoke(ctx.data().platform.as_ref(), guild, channel, member.id)
        .await?;
    reply_ephemeral(
        ctx,
        format!("✅ {} no longer has access to {}.", member.name, mention_channel(channel)),
    )
    .await
}

/// List granted members
#[poise::command(slash_command, guild_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Only this channel"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let grants = ctx.data().bypass.list(guild, channel.map(|c| c.id)).await;
    if grants.is_empty() {
        return reply_ephemeral(ctx, "No bypasses recorded.").await;
    }

    let mut embed = EmbedContent::new(String::new(), COLOR_INFO).title("🔑 Channel bypasses");
    for (channel_id, users) in grants.iter().take(25) {
        let members: Vec<String> = users.iter().map(|u| format!("<@{}>", u)).collect();
        embed = embed.field(
            format!("Channel {}", channel_id),
            format!("<#{}>\n{}", channel_id, members.join(", ")),
            false,
        );
    }
    reply_embed(ctx, embed, true).await
}
