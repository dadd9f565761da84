use poise::serenity_prelude as serenity;
use poise::ChoiceParameter;
use tracing::info;

use super::{guild_id, reply_ephemeral};
use crate::config::LogKind;
use crate::platform::mention_channel;
use crate::{Context, Error};

/// Choose the channel receiving one kind of server log
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn logs(
    ctx: Context<'_>,
    #[description = "Which log"] kind: LogKind,
    #[description = "Log channel"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    ctx.data()
        .event_log
        .set_channel(guild, kind, channel.id)
        .await?;
    info!("{} logs of guild {} now go to {}", kind.name(), guild, channel.id);
    reply_ephemeral(
        ctx,
        format!("✅ {} logs will be posted in {}.", kind.name(), mention_channel(channel.id)),
    )
    .await
}
