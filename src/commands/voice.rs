use poise::serenity_prelude as serenity;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::messages::COLOR_INFO;
use crate::platform::{mention_channel, mention_role, EmbedContent};
use crate::{Context, Error};

/// Voice channels that clone themselves for each member who joins
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    default_member_permissions = "MANAGE_CHANNELS",
    subcommands("hub", "register", "remove", "list"),
    subcommand_required
)]
pub async fn voice(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a new hub channel
#[poise::command(slash_command, guild_only)]
pub async fn hub(
    ctx: Context<'_>,
    #[description = "Hub and clone name, e.g. Duo"] name: String,
    #[description = "Category to create it in"]
    #[channel_types("Category")]
    category: Option<serenity::GuildChannel>,
    #[description = "Only this role can see the clones"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let channel = ctx
        .data()
        .voice
        .create_hub(
            ctx.data().platform.as_ref(),
            guild,
            &name,
            category.map(|c| c.id),
            role.map(|r| r.id),
        )
        .await?;
    reply_ephemeral(
        ctx,
        format!("✅ Hub {} created. Joining it spawns a personal channel.", mention_channel(channel)),
    )
    .await
}

/// Turn an existing voice channel into a hub
#[poise::command(slash_command, guild_only)]
pub async fn register(
    ctx: Context<'_>,
    #[description = "Voice channel"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
    #[description = "Clone name (defaults to the channel name)"] name: Option<String>,
    #[description = "Only this role can see the clones"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let base_name = name.unwrap_or_else(|| channel.name.clone());
    ctx.data()
        .voice
        .register_hub(guild, channel.id, &base_name, role.map(|r| r.id))
        .await?;
    reply_ephemeral(ctx, format!("✅ {} is now a hub.", mention_channel(channel.id))).await
}

/// Stop a channel from acting as a hub
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Hub channel"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    if ctx.data().voice.remove_hub(guild, channel.id).await? {
        reply_ephemeral(ctx, format!("✅ {} is no longer a hub.", mention_channel(channel.id))).await
    } else {
        reply_ephemeral(ctx, format!("{} is not a hub.", mention_channel(channel.id))).await
    }
}

/// Show the hubs of this server
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let hubs = ctx.data().voice.hubs(guild).await;
    if hubs.is_empty() {
        return reply_ephemeral(ctx, "No voice hubs configured.").await;
    }
    let lines: Vec<String> = hubs
        .iter()
        .map(|(id, hub)| {
            let visibility = match hub.visible_role_id() {
                Some(role) => format!(" (visible to {})", mention_role(role)),
                None => String::new(),
            };
            format!("<#{}> → `{} N`{}", id, hub.base_name, visibility)
        })
        .collect();
    reply_embed(
        ctx,
        EmbedContent::new(lines.join("\n"), COLOR_INFO).title("🔊 Voice hubs"),
        true,
    )
    .await
}
