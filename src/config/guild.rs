use poise::serenity_prelude::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};

/// Ticket settings for one guild
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketConfig {
    /// Role pinged and granted access in every new ticket
    #[serde(default)]
    pub ping_role: Option<String>,

    /// Footer shown under the ticket intro embed
    #[serde(default = "default_footer")]
    pub footer: String,

    /// Selectable ticket categories
    #[serde(default)]
    pub categories: Vec<TicketCategory>,

    /// Where transcripts of closed tickets are forwarded
    #[serde(default)]
    pub transcript_channel: Option<String>,
}

fn default_footer() -> String {
    "Seïko support".to_string()
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            ping_role: None,
            footer: default_footer(),
            categories: Vec::new(),
            transcript_channel: None,
        }
    }
}

impl TicketConfig {
    /// Categories offered to users; falls back to a built-in set when none are configured
    pub fn effective_categories(&self) -> Vec<TicketCategory> {
        if !self.categories.is_empty() {
            return self.categories.clone();
        }
        [
            ("Support", "General help", "🛠️"),
            ("Bug", "Report a problem", "🐞"),
            ("Other", "Anything else", "📁"),
        ]
        .into_iter()
        .map(|(name, description, emoji)| TicketCategory {
            name: name.to_string(),
            description: description.to_string(),
            emoji: emoji.to_string(),
        })
        .collect()
    }

    pub fn find_category(&self, name: &str) -> Option<TicketCategory> {
        self.effective_categories()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn ping_role_id(&self) -> Option<RoleId> {
        parse_id(self.ping_role.as_deref()).map(RoleId::new)
    }

    pub fn transcript_channel_id(&self) -> Option<ChannelId> {
        parse_id(self.transcript_channel.as_deref()).map(ChannelId::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub emoji: String,
}

/// Log channel kinds a guild can configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum LogKind {
    #[name = "message"]
    Message,
    #[name = "moderation"]
    Moderation,
    #[name = "ticket"]
    Ticket,
}

/// Log channel ids for one guild
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogsConfig {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub moderation: Option<String>,
    #[serde(default)]
    pub ticket: Option<String>,
}

impl LogsConfig {
    pub fn channel(&self, kind: LogKind) -> Option<ChannelId> {
        let raw = match kind {
            LogKind::Message => self.message.as_deref(),
            LogKind::Moderation => self.moderation.as_deref(),
            LogKind::Ticket => self.ticket.as_deref(),
        };
        parse_id(raw).map(ChannelId::new)
    }

    pub fn set_channel(&mut self, kind: LogKind, channel: ChannelId) {
        let value = Some(channel.to_string());
        match kind {
            LogKind::Message => self.message = value,
            LogKind::Moderation => self.moderation = value,
            LogKind::Ticket => self.ticket = value,
        }
    }
}

/// Welcome settings for one guild
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomeConfig {
    pub channel: String,
    #[serde(default = "default_welcome_title")]
    pub title: String,
    /// Template; `???` is replaced by the new member's mention
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_welcome_title() -> String {
    "Welcome!".to_string()
}

pub const WELCOME_PLACEHOLDER: &str = "???";

impl WelcomeConfig {
    pub fn new(channel: ChannelId, title: &str, description: &str) -> Self {
        Self {
            channel: channel.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            roles: Vec::new(),
            image_url: None,
        }
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        parse_id(Some(&self.channel)).map(ChannelId::new)
    }

    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles
            .iter()
            .filter_map(|r| parse_id(Some(r)))
            .map(RoleId::new)
            .collect()
    }

    /// Add a role once; returns false when it was already listed
    pub fn add_role(&mut self, role: RoleId) -> bool {
        let id = role.to_string();
        if self.roles.contains(&id) {
            return false;
        }
        self.roles.push(id);
        true
    }

    /// Render the description for a member mention
    pub fn render(&self, mention: &str) -> String {
        if self.description.trim().is_empty() {
            return format!("Welcome to the server, {}!", mention);
        }
        self.description.replace(WELCOME_PLACEHOLDER, mention)
    }
}

/// Parse a stored snowflake; zero and garbage are treated as absent
pub fn parse_id(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ticket_categories() {
        let config = TicketConfig::default();
        let names: Vec<String> = config
            .effective_categories()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Support", "Bug", "Other"]);
        assert!(config.find_category("support").is_some());
        assert!(config.find_category("Billing").is_none());
    }

    #[test]
    fn test_configured_categories_replace_defaults() {
        let config = TicketConfig {
            categories: vec![TicketCategory {
                name: "Billing".to_string(),
                description: String::new(),
                emoji: String::new(),
            }],
            ..Default::default()
        };
        assert!(config.find_category("Billing").is_some());
        assert!(config.find_category("Support").is_none());
    }

    #[test]
    fn test_welcome_render_and_roles() {
        let mut welcome = WelcomeConfig::new(ChannelId::new(10), "Hi", "Hello ???, enjoy!");
        assert_eq!(welcome.render("<@1>"), "Hello <@1>, enjoy!");
        assert!(welcome.add_role(RoleId::new(5)));
        assert!(!welcome.add_role(RoleId::new(5)));
        assert_eq!(welcome.role_ids(), vec![RoleId::new(5)]);

        welcome.description.clear();
        assert_eq!(welcome.render("<@1>"), "Welcome to the server, <@1>!");
    }

    #[test]
    fn test_logs_channels() {
        let mut logs = LogsConfig::default();
        assert!(logs.channel(LogKind::Message).is_none());
        logs.set_channel(LogKind::Moderation, ChannelId::new(42));
        assert_eq!(logs.channel(LogKind::Moderation), Some(ChannelId::new(42)));
        assert_eq!(parse_id(Some("0")), None);
        assert_eq!(parse_id(Some("abc")), None);
    }
}
