use poise::serenity_prelude as serenity;

use crate::state::CachedMessage;
use crate::Data;

/// Remember and log a new guild message
pub async fn handle_message(msg: &serenity::Message, data: &Data) {
    // Ignore bot messages
    if msg.author.bot {
        return;
    }
    let Some(guild_id) = msg.guild_id else {
        return;
    };

    let cached = CachedMessage {
        id: msg.id,
        channel_id: msg.channel_id,
        author_id: msg.author.id,
        content: msg.content.clone(),
    };
    data.event_log
        .on_message(data.platform.as_ref(), guild_id, cached)
        .await;
}

pub async fn handle_message_update(event: &serenity::MessageUpdateEvent, data: &Data) {
    let Some(guild_id) = event.guild_id else {
        return;
    };
    if event.author.as_ref().is_some_and(|a| a.bot) {
        return;
    }
    // Embed unfurls arrive as updates without content
    let Some(content) = event.content.as_deref() else {
        return;
    };

    data.event_log
        .on_message_edit(
            data.platform.as_ref(),
            guild_id,
            event.channel_id,
            event.id,
            event.author.as_ref().map(|a| a.id),
            content,
        )
        .await;
}

pub async fn handle_message_delete(
    guild_id: Option<serenity::GuildId>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    data: &Data,
) {
    let Some(guild_id) = guild_id else {
        return;
    };
    data.event_log
        .on_message_delete(data.platform.as_ref(), guild_id, channel_id, message_id)
        .await;
}
