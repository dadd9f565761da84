use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::info;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::managers::moderation::MODLOG_LIMIT;
use crate::managers::ModRequest;
use crate::messages::COLOR_WARNING;
use crate::platform::{mention_user, truncate_chars, EmbedContent};
use crate::{Context, Error};

fn mod_request(ctx: &Context<'_>, target: &serenity::User, reason: String) -> Result<ModRequest, Error> {
    let guild = guild_id(ctx)?;
    let guild_name = ctx
        .guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "the server".to_string());
    Ok(ModRequest {
        guild,
        guild_name,
        moderator: ctx.author().id,
        target: target.id,
        reason,
    })
}

/// Ban a user, optionally for a limited time
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    default_member_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason (at least 5 characters)"] reason: String,
    #[description = "Temporary ban length, e.g. 7d (omit for permanent)"] duration: Option<String>,
) -> Result<(), Error> {
    let request = mod_request(&ctx, &user, reason)?;
    info!("Ban of {} requested by {}", user.name, ctx.author().name);
    let entry = ctx
        .data()
        .moderation
        .ban(
            ctx.data().platform.as_ref(),
            request,
            duration.as_deref(),
            Utc::now(),
        )
        .await?;
    let until = match entry.expires_at {
        Some(at) => format!(" until <t:{}:f>", at.timestamp()),
        None => String::new(),
    };
    reply_ephemeral(ctx, format!("🔨 {} has been banned{}.", user.name, until)).await
}

/// Lift a ban
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    default_member_permissions = "BAN_MEMBERS"
)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: serenity::User,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data()
        .moderation
        .unban(ctx.data().platform.as_ref(), guild, ctx.author().id, user.id)
        .await?;
    reply_ephemeral(ctx, format!("✅ {} has been unbanned.", user.name)).await
}

/// Kick a member
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS",
    default_member_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] user: serenity::User,
    #[description = "Reason (at least 5 characters)"] reason: String,
) -> Result<(), Error> {
    let request = mod_request(&ctx, &user, reason)?;
    ctx.data()
        .moderation
        .kick(ctx.data().platform.as_ref(), request)
        .await?;
    reply_ephemeral(ctx, format!("👢 {} has been kicked.", user.name)).await
}

/// Time a member out
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] user: serenity::User,
    #[description = "How long, between 1s and 28d (e.g. 10m)"] duration: String,
    #[description = "Reason (at least 5 characters)"] reason: String,
) -> Result<(), Error> {
    let request = mod_request(&ctx, &user, reason)?;
    let entry = ctx
        .data()
        .moderation
        .mute(ctx.data().platform.as_ref(), request, &duration, Utc::now())
        .await?;
    let until = entry
        .expires_at
        .map(|at| format!(" until <t:{}:f>", at.timestamp()))
        .unwrap_or_default();
    reply_ephemeral(ctx, format!("🔇 {} has been muted{}.", user.name, until)).await
}

/// Lift a member's timeout
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] user: serenity::User,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data()
        .moderation
        .unmute(ctx.data().platform.as_ref(), guild, ctx.author().id, user.id)
        .await?;
    reply_ephemeral(ctx, format!("🔊 {} has been unmuted.", user.name)).await
}

/// Warn a member
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "Member to warn"] user: serenity::User,
    #[description = "Reason (at least 5 characters)"] reason: String,
) -> Result<(), Error> {
    let request = mod_request(&ctx, &user, reason)?;
    let count = ctx
        .data()
        .moderation
        .warn(ctx.data().platform.as_ref(), request, Utc::now())
        .await?;
    reply_ephemeral(
        ctx,
        format!("⚠️ {} has been warned ({} warn(s) in total).", user.name, count),
    )
    .await
}

/// Show a member's warnings
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn modlog(
    ctx: Context<'_>,
    #[description = "Member to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let (total, latest) = ctx.data().moderation.modlog(guild, user.id).await;
    if total == 0 {
        return reply_ephemeral(ctx, format!("{} has no warnings.", user.name)).await;
    }

    let mut embed = EmbedContent::new(
        format!("{} has {} warning(s).", mention_user(user.id), total),
        COLOR_WARNING,
    )
    .title(format!("Moderation log: {}", user.name))
    .thumbnail(Some(user.face()));
    for (i, entry) in latest.iter().enumerate() {
        embed = embed.field(
            format!("#{}  <t:{}:d>", total - i, entry.timestamp.timestamp()),
            format!(
                "{}\nBy <@{}>",
                truncate_chars(&entry.reason, 900),
                entry.moderator
            ),
            false,
        );
    }
    if total > MODLOG_LIMIT {
        embed = embed.footer(format!("Showing the latest {} of {}", MODLOG_LIMIT, total));
    }
    reply_embed(ctx, embed, true).await
}
