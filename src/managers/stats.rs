use std::time::Duration;

use crate::duration::format_seconds;
use crate::messages::COLOR_INFO;
use crate::platform::EmbedContent;

/// Server figures shown by `/stats`
#[derive(Debug, Clone, Default)]
pub struct GuildStats {
    pub name: String,
    pub members: u64,
    pub bots: u64,
    pub channels: usize,
    pub roles: usize,
    pub latency: Option<Duration>,
    pub uptime: Duration,
    pub icon_url: Option<String>,
}

impl GuildStats {
    pub fn humans(&self) -> u64 {
        self.members.saturating_sub(self.bots)
    }

    pub fn embed(&self) -> EmbedContent {
        let latency = self
            .latency
            .map(|l| format!("{} ms", l.as_millis()))
            .unwrap_or_else(|| "n/a".to_string());

        EmbedContent::new(String::new(), COLOR_INFO)
            .title(format!("📊 {}", self.name))
            .field("👥 Members", self.members.to_string(), true)
            .field("🧑 Humans", self.humans().to_string(), true)
            .field("🤖 Bots", self.bots.to_string(), true)
            .field("💬 Channels", self.channels.to_string(), true)
            .field("🏷️ Roles", self.roles.to_string(), true)
            .field("📶 Latency", latency, true)
            .field("⏱️ Uptime", format_seconds(self.uptime.as_secs()), true)
            .thumbnail(self.icon_url.clone())
            .timestamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_embed() {
        let stats = GuildStats {
            name: "Test server".to_string(),
            members: 120,
            bots: 4,
            channels: 30,
            roles: 12,
            latency: Some(Duration::from_millis(42)),
            uptime: Duration::from_secs(3_660),
            icon_url: None,
        };
        assert_eq!(stats.humans(), 116);

        let embed = stats.embed();
        let value = |name: &str| {
            embed
                .fields
                .iter()
                .find(|f| f.name.contains(name))
                .map(|f| f.value.clone())
                .unwrap()
        };
        assert_eq!(value("Humans"), "116");
        assert_eq!(value("Latency"), "42 ms");
        assert_eq!(value("Uptime"), "1h 1m");
    }
}
