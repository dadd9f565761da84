use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One warning issued to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarnEntry {
    pub moderator: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Current ban or mute of a user; a newer sanction replaces it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionEntry {
    pub moderator: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Moderation history of one guild (user id -> entries)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationLog {
    #[serde(default)]
    pub warns: BTreeMap<String, Vec<WarnEntry>>,
    #[serde(default)]
    pub bans: BTreeMap<String, SanctionEntry>,
    #[serde(default)]
    pub mutes: BTreeMap<String, SanctionEntry>,
}

impl ModerationLog {
    pub fn add_warn(&mut self, user_id: &str, entry: WarnEntry) -> usize {
        let warns = self.warns.entry(user_id.to_string()).or_default();
        warns.push(entry);
        warns.len()
    }

    pub fn warns_for(&self, user_id: &str) -> &[WarnEntry] {
        self.warns.get(user_id).map(|w| w.as_slice()).unwrap_or(&[])
    }

    /// Temporary bans whose expiry has passed, with that expiry
    pub fn expired_bans(&self, now: DateTime<Utc>) -> Vec<(String, DateTime<Utc>)> {
        self.bans
            .iter()
            .filter_map(|(user, ban)| match ban.expires_at {
                Some(at) if at <= now => Some((user.clone(), at)),
                _ => None,
            })
            .collect()
    }

    /// Drop a user's ban only if it is still the one expiring at `expires_at`
    pub fn clear_expired_ban(&mut self, user_id: &str, expires_at: DateTime<Utc>) -> bool {
        match self.bans.get(user_id) {
            Some(ban) if ban.expires_at == Some(expires_at) => {
                self.bans.remove(user_id);
                true
            }
            _ => false,
        }
    }
}
