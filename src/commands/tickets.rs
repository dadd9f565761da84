use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::info;

use super::{can_manage_channels, guild_id, reply_ephemeral};
use crate::config::TicketCategory;
use crate::managers::Actor;
use crate::platform::{mention_channel, Platform};
use crate::{Context, Error};

/// Support tickets
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "create",
        "panel",
        "claim",
        "close",
        "category",
        "ping_role",
        "footer",
        "transcripts"
    ),
    subcommand_required
)]
pub async fn ticket(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Open a private ticket
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Ticket category (Support, Bug, Other by default)"] category: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let author = ctx.author();
    info!("Ticket create called by {} in {}", author.name, guild);

    let record = ctx
        .data()
        .tickets
        .create(
            ctx.data().platform.as_ref(),
            guild,
            author.id,
            &author.name,
            &category,
            Utc::now(),
        )
        .await?;

    reply_ephemeral(ctx, format!("✅ Your ticket has been opened: <#{}>", record.id)).await
}

/// Post the ticket panel in this channel
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    default_member_permissions = "MANAGE_CHANNELS"
)]
pub async fn panel(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let message = ctx.data().tickets.panel_message(guild).await;
    ctx.data()
        .platform
        .send_message(ctx.channel_id(), message)
        .await?;
    reply_ephemeral(ctx, "✅ Ticket panel posted.").await
}

/// Claim the ticket in this channel
#[poise::command(slash_command, guild_only)]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let actor = Actor {
        id: ctx.author().id,
        can_manage: can_manage_channels(ctx).await,
    };
    ctx.data()
        .tickets
        .claim(ctx.data().platform.as_ref(), guild, ctx.channel_id(), actor)
        .await?;
    reply_ephemeral(ctx, "✅ Ticket claimed.").await
}

/// Close the ticket in this channel
#[poise::command(slash_command, guild_only)]
pub async fn close(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let actor = Actor {
        id: ctx.author().id,
        can_manage: can_manage_channels(ctx).await,
    };
    ctx.data()
        .tickets
        .close(
            ctx.data().platform.as_ref(),
            guild,
            ctx.channel_id(),
            actor,
            Utc::now(),
        )
        .await?;
    reply_ephemeral(ctx, "✅ Ticket closed.").await
}

/// Manage ticket categories
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR",
    subcommands("category_add", "category_delete", "category_edit"),
    subcommand_required
)]
pub async fn category(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a ticket category
#[poise::command(slash_command, guild_only, rename = "add")]
pub async fn category_add(
    ctx: Context<'_>,
    #[description = "Category name"] name: String,
    #[description = "Shown under the name in the panel"] description: Option<String>,
    #[description = "Emoji shown next to the name"] emoji: Option<String>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data()
        .tickets
        .add_category(
            guild,
            TicketCategory {
                name: name.clone(),
                description: description.unwrap_or_default(),
                emoji: emoji.unwrap_or_default(),
            },
        )
        .await?;
    reply_ephemeral(ctx, format!("✅ Category '{}' added.", name.trim())).await
}

/// Delete a ticket category
#[poise::command(slash_command, guild_only, rename = "delete")]
pub async fn category_delete(
    ctx: Context<'_>,
    #[description = "Category name"] name: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data().tickets.delete_category(guild, &name).await?;
    reply_ephemeral(ctx, format!("✅ Category '{}' deleted.", name)).await
}

/// Rename a category or change its description or emoji
#[poise::command(slash_command, guild_only, rename = "edit")]
pub async fn category_edit(
    ctx: Context<'_>,
    #[description = "Category name"] name: String,
    #[description = "New name"] new_name: Option<String>,
    #[description = "New description"] description: Option<String>,
    #[description = "New emoji"] emoji: Option<String>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    if new_name.is_none() && description.is_none() && emoji.is_none() {
        return reply_ephemeral(ctx, "Nothing to change: give a new name, a description or an emoji.")
            .await;
    }
    let shown = new_name.as_deref().unwrap_or(&name).trim().to_string();
    ctx.data()
        .tickets
        .edit_category(guild, &name, new_name.clone(), description, emoji)
        .await?;
    reply_ephemeral(ctx, format!("✅ Category '{}' updated.", shown)).await
}

/// Role pinged and given access in new tickets (omit to clear)
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn ping_role(
    ctx: Context<'_>,
    #[description = "Staff role"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let role_id = role.as_ref().map(|r| r.id);
    ctx.data().tickets.set_ping_role(guild, role_id).await?;
    match role {
        Some(role) => reply_ephemeral(ctx, format!("✅ New tickets will ping {}.", role.name)).await,
        None => reply_ephemeral(ctx, "✅ Ticket ping role cleared.").await,
    }
}

/// Footer text of the ticket panel
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn footer(
    ctx: Context<'_>,
    #[description = "Footer text"] text: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data().tickets.set_footer(guild, &text).await?;
    reply_ephemeral(ctx, "✅ Panel footer updated.").await
}

/// Channel receiving transcripts of closed tickets (omit to DM the closer)
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn transcripts(
    ctx: Context<'_>,
    #[description = "Transcript channel"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let channel_id = channel.map(|c| c.id);
    ctx.data()
        .tickets
        .set_transcript_channel(guild, channel_id)
        .await?;
    match channel_id {
        Some(id) => {
            reply_ephemeral(ctx, format!("✅ Transcripts will be posted in {}.", mention_channel(id)))
                .await
        }
        None => reply_ephemeral(ctx, "✅ Transcripts will be sent to whoever closes the ticket.").await,
    }
}
