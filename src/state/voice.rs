use poise::serenity_prelude::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::guild::parse_id;

/// A "hub" voice channel: joining it spawns a personal clone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubConfig {
    pub base_name: String,

    /// When set, clones are only visible to this role
    #[serde(default)]
    pub visible_role: Option<String>,
}

impl HubConfig {
    pub fn visible_role_id(&self) -> Option<RoleId> {
        parse_id(self.visible_role.as_deref()).map(RoleId::new)
    }

    pub fn clone_name(&self, number: u32) -> String {
        format!("{} {}", self.base_name, number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloneRecord {
    pub hub_id: String,
    pub number: u32,
}

/// Voice hub settings and live clones of one guild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildVoice {
    /// Hub channel id -> settings
    #[serde(default)]
    pub hubs: BTreeMap<String, HubConfig>,

    /// Clone channel id -> record
    #[serde(default)]
    pub clones: BTreeMap<String, CloneRecord>,
}

impl GuildVoice {
    /// Lowest number >= 1 not used by a live clone of this hub
    pub fn next_clone_number(&self, hub_id: &str) -> u32 {
        let used: BTreeSet<u32> = self
            .clones
            .values()
            .filter(|c| c.hub_id == hub_id)
            .map(|c| c.number)
            .collect();
        lowest_unused(&used)
    }
}

pub fn lowest_unused(used: &BTreeSet<u32>) -> u32 {
    (1..).find(|n| !used.contains(n)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_unused_fills_gaps() {
        let mut voice = GuildVoice::default();
        assert_eq!(voice.next_clone_number("1"), 1);

        for (id, n) in [("10", 1), ("11", 2), ("12", 4)] {
            voice.clones.insert(
                id.to_string(),
                CloneRecord {
                    hub_id: "1".to_string(),
                    number: n,
                },
            );
        }
        assert_eq!(voice.next_clone_number("1"), 3);
        // Other hubs number independently
        assert_eq!(voice.next_clone_number("2"), 1);
    }

    #[test]
    fn test_clone_name() {
        let hub = HubConfig {
            base_name: "Assistance".to_string(),
            visible_role: Some("77".to_string()),
        };
        assert_eq!(hub.clone_name(2), "Assistance 2");
        assert_eq!(hub.visible_role_id(), Some(RoleId::new(77)));
    }
}
