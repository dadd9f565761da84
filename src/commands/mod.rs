pub mod bypass;
pub mod general;
pub mod giveaways;
pub mod logs;
pub mod moderation;
pub mod reviews;
pub mod tickets;
pub mod voice;
pub mod welcome;

use poise::serenity_prelude as serenity;

use crate::platform::EmbedContent;
use crate::{Context, Data, Error};

pub use bypass::bypass;
pub use general::{help, ping, say, say_dm, stats, status};
pub use giveaways::giveaway;
pub use logs::logs;
pub use moderation::{ban, kick, modlog, mute, unban, unmute, warn};
pub use reviews::{review, review_stats};
pub use tickets::ticket;
pub use voice::voice;
pub use welcome::welcome;

/// Every slash command the bot registers
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        ping(),
        help(),
        stats(),
        say(),
        say_dm(),
        status(),
        ticket(),
        giveaway(),
        ban(),
        unban(),
        kick(),
        mute(),
        unmute(),
        warn(),
        modlog(),
        logs(),
        welcome(),
        voice(),
        bypass(),
        review(),
        review_stats(),
    ]
}

pub(crate) fn guild_id(ctx: &Context<'_>) -> Result<serenity::GuildId, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command can only be used in a server")?)
}

pub(crate) async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

pub(crate) async fn reply_embed(ctx: Context<'_>, embed: EmbedContent, ephemeral: bool) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .embed(embed.into())
            .ephemeral(ephemeral),
    )
    .await?;
    Ok(())
}

/// Whether the invoker holds MANAGE_CHANNELS in this channel
pub(crate) async fn can_manage_channels(ctx: Context<'_>) -> bool {
    match ctx.author_member().await {
        Some(member) => member
            .permissions
            .map(|p| p.manage_channels() || p.administrator())
            .unwrap_or(false),
        None => false,
    }
}
