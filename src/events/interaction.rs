use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use crate::components::ComponentAction;
use crate::error::{BotError, Result};
use crate::managers::Actor;
use crate::state::JoinOutcome;
use crate::{Data, Error};

/// Handle button clicks and select menus on the bot's persistent messages
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> std::result::Result<(), Error> {
    let Some(component) = interaction.as_message_component() else {
        return Ok(());
    };
    let action: ComponentAction = match component.data.custom_id.parse() {
        Ok(action) => action,
        Err(e) => {
            debug!("Ignoring component: {}", e);
            return Ok(());
        }
    };
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    info!(
        "Component '{}' used by {} in guild {}",
        action, component.user.name, guild_id
    );

    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let reply = match run_action(component, guild_id, action, data).await {
        Ok(text) => text,
        Err(e) => format!("❌ {}", e),
    };
    component
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(reply)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

fn can_manage_channels(component: &serenity::ComponentInteraction) -> bool {
    component
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .map(|p| p.manage_channels() || p.administrator())
        .unwrap_or(false)
}

async fn run_action(
    component: &serenity::ComponentInteraction,
    guild_id: serenity::GuildId,
    action: ComponentAction,
    data: &Data,
) -> Result<String> {
    let platform = data.platform.as_ref();
    let user = &component.user;
    let channel = component.channel_id;
    let actor = Actor {
        id: user.id,
        can_manage: can_manage_channels(component),
    };

    match action {
        ComponentAction::TicketOpen => {
            let category = match &component.data.kind {
                serenity::ComponentInteractionDataKind::StringSelect { values } => {
                    values.first().cloned()
                }
                _ => None,
            }
            .ok_or_else(|| BotError::validation("Pick a category from the menu."))?;
            let record = data
                .tickets
                .create(platform, guild_id, user.id, &user.name, &category, Utc::now())
                .await?;
            Ok(format!("✅ Your ticket has been opened: <#{}>", record.id))
        }
        ComponentAction::TicketClaim => {
            data.tickets.claim(platform, guild_id, channel, actor).await?;
            Ok("✅ Ticket claimed.".to_string())
        }
        ComponentAction::TicketClose => {
            data.tickets
                .close(platform, guild_id, channel, actor, Utc::now())
                .await?;
            Ok("✅ Ticket closed.".to_string())
        }
        ComponentAction::TicketTranscript => {
            match data
                .tickets
                .send_transcript(platform, guild_id, channel, user.id)
                .await
            {
                Ok(()) => Ok("📄 The transcript has been sent to your DMs.".to_string()),
                Err(e @ BotError::NotFound { .. }) => Err(e),
                Err(e) => {
                    debug!("Transcript DM to {} failed: {}", user.id, e);
                    Ok("❌ Could not send you the transcript. Are your DMs open?".to_string())
                }
            }
        }
        ComponentAction::GiveawayJoin { giveaway_id } => {
            match data.giveaways.join(guild_id, &giveaway_id, user.id).await {
                Ok(JoinOutcome::Joined) => Ok("🎉 Your entry has been recorded. Good luck!".to_string()),
                Ok(JoinOutcome::AlreadyJoined) => Ok("You are already participating in this giveaway.".to_string()),
                Ok(JoinOutcome::Ended) => Ok("This giveaway has already ended.".to_string()),
                Err(BotError::NotFound { .. }) => Ok("This giveaway no longer exists.".to_string()),
                Err(e) => Err(e),
            }
        }
    }
}
