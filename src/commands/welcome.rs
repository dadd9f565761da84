use poise::serenity_prelude as serenity;

use super::{guild_id, reply_ephemeral};
use crate::config::WELCOME_PLACEHOLDER;
use crate::error::BotError;
use crate::platform::{mention_channel, Platform};
use crate::{Context, Error};

/// Greet new members
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR",
    subcommands("create", "role", "image", "test", "disable"),
    subcommand_required
)]
pub async fn welcome(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Set the welcome channel and message
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Where new members are greeted"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
    #[description = "Embed title"] title: String,
    #[description = "Message text, ??? is replaced by the new member"] description: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data()
        .welcome
        .configure(guild, channel.id, &title, &description)
        .await?;
    let hint = if description.contains(WELCOME_PLACEHOLDER) {
        ""
    } else {
        "\nTip: put `???` in the text to mention the new member."
    };
    reply_ephemeral(
        ctx,
        format!("✅ New members will be welcomed in {}.{}", mention_channel(channel.id), hint),
    )
    .await
}

/// Give a role to every new member
#[poise::command(slash_command, guild_only)]
pub async fn role(
    ctx: Context<'_>,
    #[description = "Role given on join"] role: serenity::Role,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    if ctx.data().welcome.add_role(guild, role.id).await? {
        reply_ephemeral(ctx, format!("✅ New members will receive {}.", role.name)).await
    } else {
        reply_ephemeral(ctx, format!("{} is already given on join.", role.name)).await
    }
}

/// Image shown in the welcome embed (omit to remove)
#[poise::command(slash_command, guild_only)]
pub async fn image(
    ctx: Context<'_>,
    #[description = "Image URL"] url: Option<String>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    if let Some(url) = &url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(BotError::validation("The image must be an http(s) URL.").into());
        }
    }
    let removed = url.is_none();
    ctx.data().welcome.set_image(guild, url).await?;
    if removed {
        reply_ephemeral(ctx, "✅ Welcome image removed.").await
    } else {
        reply_ephemeral(ctx, "✅ Welcome image updated.").await
    }
}

/// Preview the welcome message on yourself
#[poise::command(slash_command, guild_only)]
pub async fn test(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let platform = ctx.data().platform.as_ref();
    let member = platform
        .member(guild, ctx.author().id)
        .await?
        .ok_or_else(|| BotError::MemberNotFound {
            id: ctx.author().id.to_string(),
        })?;
    if ctx.data().welcome.greet(platform, guild, &member).await? {
        reply_ephemeral(ctx, "✅ Test welcome message sent.").await
    } else {
        reply_ephemeral(ctx, "Welcome messages are not configured. Use /welcome create first.").await
    }
}

/// Stop greeting new members
#[poise::command(slash_command, guild_only)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    if ctx.data().welcome.disable(guild).await? {
        reply_ephemeral(ctx, "✅ Welcome messages disabled.").await
    } else {
        reply_ephemeral(ctx, "Welcome messages were not configured.").await
    }
}
