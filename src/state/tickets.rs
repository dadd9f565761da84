use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::TicketConfig;

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketState {
    Open,
    Claimed,
    Closed,
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TicketState::Open => "OPEN",
            TicketState::Claimed => "CLAIMED",
            TicketState::Closed => "CLOSED",
        };
        f.write_str(label)
    }
}

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyClaimed,
    AlreadyClosed,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::AlreadyClaimed => f.write_str("This ticket is already claimed."),
            TransitionError::AlreadyClosed => f.write_str("This ticket is already closed."),
        }
    }
}

/// A ticket, keyed in storage by its backing channel id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketRecord {
    /// Backing channel id
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub state: TicketState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl TicketRecord {
    pub fn open(channel_id: &str, user_id: &str, category: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: channel_id.to_string(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            created_at: now,
            state: TicketState::Open,
            claimed_by: None,
            closed_by: None,
            closed_at: None,
        }
    }

    /// OPEN -> CLAIMED
    pub fn claim(&mut self, by: &str) -> Result<(), TransitionError> {
        match self.state {
            TicketState::Open => {
                self.state = TicketState::Claimed;
                self.claimed_by = Some(by.to_string());
                Ok(())
            }
            TicketState::Claimed => Err(TransitionError::AlreadyClaimed),
            TicketState::Closed => Err(TransitionError::AlreadyClosed),
        }
    }

    /// OPEN or CLAIMED -> CLOSED
    pub fn close(&mut self, by: &str, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.state {
            TicketState::Open | TicketState::Claimed => {
                self.state = TicketState::Closed;
                self.closed_by = Some(by.to_string());
                self.closed_at = Some(now);
                Ok(())
            }
            TicketState::Closed => Err(TransitionError::AlreadyClosed),
        }
    }

    /// Closed long enough ago that its channel should go
    pub fn is_due_for_deletion(&self, now: DateTime<Utc>, delete_after: chrono::Duration) -> bool {
        match (self.state, self.closed_at) {
            (TicketState::Closed, Some(closed_at)) => closed_at
                .checked_add_signed(delete_after)
                .is_some_and(|due| due <= now),
            _ => false,
        }
    }
}

/// Ticket settings plus live records for one guild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildTickets {
    #[serde(default)]
    pub config: TicketConfig,

    /// Channel id -> ticket
    #[serde(default)]
    pub tickets: BTreeMap<String, TicketRecord>,
}

impl GuildTickets {
    pub fn due_for_deletion(
        &self,
        now: DateTime<Utc>,
        delete_after: chrono::Duration,
    ) -> Vec<TicketRecord> {
        self.tickets
            .values()
            .filter(|t| t.is_due_for_deletion(now, delete_after))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket() -> TicketRecord {
        TicketRecord::open("100", "7", "Support", Utc::now())
    }

    #[test]
    fn test_open_claim_close() {
        let mut t = ticket();
        assert_eq!(t.state, TicketState::Open);

        t.claim("8").unwrap();
        assert_eq!(t.state, TicketState::Claimed);
        assert_eq!(t.claimed_by.as_deref(), Some("8"));

        let now = Utc::now();
        t.close("8", now).unwrap();
        assert_eq!(t.state, TicketState::Closed);
        assert_eq!(t.closed_at, Some(now));
    }

    #[test]
    fn test_close_without_claim() {
        let mut t = ticket();
        t.close("9", Utc::now()).unwrap();
        assert_eq!(t.state, TicketState::Closed);
        assert!(t.claimed_by.is_none());
        assert!(t.closed_at.is_some());
    }

    #[test]
    fn test_illegal_transitions_are_no_ops() {
        let mut t = ticket();
        t.claim("8").unwrap();
        let before = t.clone();
        assert_eq!(t.claim("9"), Err(TransitionError::AlreadyClaimed));
        assert_eq!(t, before);

        t.close("8", Utc::now()).unwrap();
        let before = t.clone();
        assert_eq!(t.claim("9"), Err(TransitionError::AlreadyClosed));
        assert_eq!(t.close("9", Utc::now()), Err(TransitionError::AlreadyClosed));
        assert_eq!(t, before);
    }

    #[test]
    fn test_due_for_deletion() {
        let mut t = ticket();
        let closed_at = Utc::now();
        assert!(!t.is_due_for_deletion(closed_at + Duration::days(2), Duration::hours(24)));

        t.close("8", closed_at).unwrap();
        assert!(!t.is_due_for_deletion(closed_at + Duration::hours(23), Duration::hours(24)));
        assert!(t.is_due_for_deletion(closed_at + Duration::hours(24), Duration::hours(24)));
        // An overflowing deadline is never reached
        assert!(!t.is_due_for_deletion(closed_at + Duration::days(2), Duration::MAX));
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_string(&ticket()).unwrap();
        assert!(json.contains("\"state\":\"OPEN\""));
        assert!(!json.contains("closed_at"));
    }
}
