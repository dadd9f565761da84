use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiveawayRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Unix timestamp (seconds) at which the giveaway resolves
    pub end_time: i64,
    pub winners: u32,
    pub channel_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(default)]
    pub host_id: String,

    #[serde(default)]
    pub participants: Vec<String>,

    #[serde(default)]
    pub ended: bool,

    /// Winners of the latest draw
    #[serde(default)]
    pub drawn_winners: Vec<String>,
}

impl GiveawayRecord {
    /// Register a participant; a second entry from the same user changes nothing
    pub fn join(&mut self, user_id: &str) -> JoinOutcome {
        if self.ended {
            return JoinOutcome::Ended;
        }
        if self.participants.iter().any(|p| p == user_id) {
            return JoinOutcome::AlreadyJoined;
        }
        self.participants.push(user_id.to_string());
        JoinOutcome::Joined
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.ended && self.end_time <= now.timestamp()
    }
}

/// Giveaways of one guild, keyed by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildGiveaways {
    #[serde(default)]
    pub giveaways: BTreeMap<String, GiveawayRecord>,
}

impl GuildGiveaways {
    /// Id derived from the end timestamp; same-second collisions get a `-N` suffix
    pub fn next_id(&self, end_time: i64) -> String {
        let base = end_time.to_string();
        if !self.giveaways.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.giveaways.contains_key(candidate))
            .unwrap_or(base)
    }

    pub fn due(&self, now: DateTime<Utc>) -> Vec<String> {
        self.giveaways
            .values()
            .filter(|g| g.is_due(now))
            .map(|g| g.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn giveaway(id: &str) -> GiveawayRecord {
        GiveawayRecord {
            id: id.to_string(),
            title: "Nitro".to_string(),
            description: "One month".to_string(),
            end_time: 1_000,
            winners: 1,
            channel_id: "5".to_string(),
            message_id: None,
            host_id: "1".to_string(),
            participants: vec![],
            ended: false,
            drawn_winners: vec![],
        }
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut g = giveaway("1000");
        assert_eq!(g.join("42"), JoinOutcome::Joined);
        assert_eq!(g.join("42"), JoinOutcome::AlreadyJoined);
        assert_eq!(g.participants, vec!["42".to_string()]);

        g.ended = true;
        assert_eq!(g.join("43"), JoinOutcome::Ended);
        assert_eq!(g.participants.len(), 1);
    }

    #[test]
    fn test_next_id_avoids_collisions() {
        let mut guild = GuildGiveaways::default();
        assert_eq!(guild.next_id(1_000), "1000");
        guild.giveaways.insert("1000".to_string(), giveaway("1000"));
        assert_eq!(guild.next_id(1_000), "1000-2");
        guild.giveaways.insert("1000-2".to_string(), giveaway("1000-2"));
        assert_eq!(guild.next_id(1_000), "1000-3");
    }

    #[test]
    fn test_due() {
        let mut guild = GuildGiveaways::default();
        guild.giveaways.insert("1000".to_string(), giveaway("1000"));
        let mut ended = giveaway("900");
        ended.end_time = 900;
        ended.ended = true;
        guild.giveaways.insert("900".to_string(), ended);

        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        assert_eq!(guild.due(now), vec!["1000".to_string()]);
        let before = DateTime::from_timestamp(999, 0).unwrap();
        assert!(guild.due(before).is_empty());
    }
}
