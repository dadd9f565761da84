// src/messages.rs

pub const COLOR_INFO: u32 = 0x5865F2;
pub const COLOR_SUCCESS: u32 = 0x57F287;
pub const COLOR_WARNING: u32 = 0xFEE75C;
pub const COLOR_DANGER: u32 = 0xED4245;
pub const COLOR_GIVEAWAY: u32 = 0xEB459E;

pub fn ticket_opened_message(mention: &str, category: &str) -> String {
    format!(
        "👋 Hello {}!\n\n\
        Your **{}** ticket is open. Describe your request and a member of staff will be with you shortly.\n\n\
        • **Claim** lets a staff member take charge of the ticket\n\
        • **Close** ends the conversation\n\
        • **Transcript** sends you a copy of this channel",
        mention, category
    )
}

pub fn ticket_closed_message(closer: &str, delete_after: &str) -> String {
    format!(
        "🔒 **Ticket closed** by {}.\n\n\
        This channel will be deleted in {}.",
        closer, delete_after
    )
}

pub fn moderation_dm(action: &str, guild_name: &str, reason: &str) -> String {
    format!(
        "⚠️ You have been **{}** on **{}**.\n\n\
        **Reason:** {}\n\n\
        If you think this is a mistake, please contact the server staff.",
        action, guild_name, reason
    )
}

pub fn help_message() -> String {
    "📖 **Available commands**\n\n\
    **General**\n\
    `/ping` · `/help` · `/stats`\n\n\
    **Tickets**\n\
    `/ticket create` · `/ticket claim` · `/ticket close` · `/ticket panel` · `/ticket category add|delete|edit` · `/ticket ping_role` · `/ticket footer` · `/ticket transcripts`\n\n\
    **Giveaways**\n\
    `/giveaway create` · `/giveaway end` · `/giveaway reroll` · `/giveaway list`\n\n\
    **Moderation**\n\
    `/ban` · `/unban` · `/kick` · `/mute` · `/unmute` · `/warn` · `/modlog`\n\n\
    **Server setup**\n\
    `/welcome create|role|image|test|disable` · `/logs` · `/voice hub|register|remove|list` · `/bypass add|del|list`\n\n\
    **Community**\n\
    `/review` · `/review_stats`\n\n\
    **Staff**\n\
    `/say` · `/say_dm` · `/status`"
        .to_string()
}

pub fn status_message(status: &str) -> (String, u32) {
    match status {
        "maintenance" => (
            "🛠️ **Maintenance**\n\nThe bot is under maintenance. Some features may be unavailable for a while.".to_string(),
            COLOR_WARNING,
        ),
        "restart" => (
            "🔄 **Restarting**\n\nThe bot is restarting and will be back in a moment.".to_string(),
            COLOR_DANGER,
        ),
        _ => (
            "✅ **Online**\n\nThe bot is up and running.".to_string(),
            COLOR_SUCCESS,
        ),
    }
}
