use poise::serenity_prelude as serenity;
use tracing::info;

use crate::platform::MemberSummary;
use crate::{Data, Error};

/// Handle when a new member joins the guild
pub async fn handle_member_add(new_member: &serenity::Member, data: &Data) -> Result<(), Error> {
    info!(
        "New member joined: {} in guild {}",
        new_member.user.name, new_member.guild_id
    );

    let member = MemberSummary {
        user_id: new_member.user.id,
        name: new_member.user.name.clone(),
        is_bot: new_member.user.bot,
        is_admin: false,
        avatar_url: Some(new_member.face()),
    };
    data.welcome
        .greet(data.platform.as_ref(), new_member.guild_id, &member)
        .await?;
    Ok(())
}

pub async fn handle_channel_create(channel: &serenity::GuildChannel, data: &Data) {
    data.event_log
        .on_channel_created(data.platform.as_ref(), channel.guild_id, channel.id, &channel.name)
        .await;
}

pub async fn handle_channel_delete(channel: &serenity::GuildChannel, data: &Data) {
    data.event_log
        .on_channel_deleted(data.platform.as_ref(), channel.guild_id, &channel.name)
        .await;
}

pub async fn handle_role_create(role: &serenity::Role, data: &Data) {
    data.event_log
        .on_role_created(data.platform.as_ref(), role.guild_id, &role.name)
        .await;
}

pub async fn handle_role_delete(
    guild_id: serenity::GuildId,
    role_id: serenity::RoleId,
    role: Option<&serenity::Role>,
    data: &Data,
) {
    let name = match role {
        Some(role) => role.name.clone(),
        None => role_id.to_string(),
    };
    data.event_log
        .on_role_deleted(data.platform.as_ref(), guild_id, &name)
        .await;
}
