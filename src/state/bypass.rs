use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manual channel-access grants of one guild (channel id -> user ids)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildBypass {
    pub channels: BTreeMap<String, Vec<String>>,
}

impl GuildBypass {
    /// Returns false when the user was already listed
    pub fn add(&mut self, channel_id: &str, user_id: &str) -> bool {
        let users = self.channels.entry(channel_id.to_string()).or_default();
        if users.iter().any(|u| u == user_id) {
            return false;
        }
        users.push(user_id.to_string());
        true
    }

    /// Returns false when the user wasn't listed; empty channels are dropped
    pub fn remove(&mut self, channel_id: &str, user_id: &str) -> bool {
        let Some(users) = self.channels.get_mut(channel_id) else {
            return false;
        };
        let before = users.len();
        users.retain(|u| u != user_id);
        let removed = users.len() != before;
        if users.is_empty() {
            self.channels.remove(channel_id);
        }
        removed
    }

    pub fn users_in(&self, channel_id: &str) -> &[String] {
        self.channels
            .get(channel_id)
            .map(|u| u.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut bypass = GuildBypass::default();
        assert!(bypass.add("1", "10"));
        assert!(!bypass.add("1", "10"));
        assert!(bypass.add("1", "11"));
        assert_eq!(bypass.users_in("1").len(), 2);

        assert!(bypass.remove("1", "10"));
        assert!(!bypass.remove("1", "10"));
        assert!(bypass.remove("1", "11"));
        assert!(bypass.channels.is_empty());
        assert!(!bypass.remove("2", "10"));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut bypass = GuildBypass::default();
        bypass.add("1", "10");
        assert_eq!(serde_json::to_string(&bypass).unwrap(), r#"{"1":["10"]}"#);
    }
}
