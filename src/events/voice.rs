use poise::serenity_prelude as serenity;

use crate::{Data, Error};

/// Spawn or clean up voice clones as members move around
pub async fn handle_voice_state_update(
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };
    let old_channel = old.and_then(|state| state.channel_id);

    data.voice
        .on_voice_update(
            data.platform.as_ref(),
            guild_id,
            new.user_id,
            old_channel,
            new.channel_id,
        )
        .await?;
    Ok(())
}
