//! Button and select-menu ids, decoded once at the interaction boundary.

use std::fmt;
use std::str::FromStr;

const TICKET_OPEN: &str = "ticket:open";
const TICKET_CLAIM: &str = "ticket:claim";
const TICKET_CLOSE: &str = "ticket:close";
const TICKET_TRANSCRIPT: &str = "ticket:transcript";
const GIVEAWAY_JOIN_PREFIX: &str = "giveaway:join:";

/// Everything a persistent component on one of our messages can ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    /// Category select menu on the ticket panel
    TicketOpen,
    TicketClaim,
    TicketClose,
    TicketTranscript,
    GiveawayJoin { giveaway_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComponent(pub String);

impl fmt::Display for UnknownComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown component id '{}'", self.0)
    }
}

impl std::error::Error for UnknownComponent {}

impl FromStr for ComponentAction {
    type Err = UnknownComponent;

    fn from_str(custom_id: &str) -> Result<Self, Self::Err> {
        match custom_id {
            TICKET_OPEN => Ok(ComponentAction::TicketOpen),
            TICKET_CLAIM => Ok(ComponentAction::TicketClaim),
            TICKET_CLOSE => Ok(ComponentAction::TicketClose),
            TICKET_TRANSCRIPT => Ok(ComponentAction::TicketTranscript),
            other => match other.strip_prefix(GIVEAWAY_JOIN_PREFIX) {
                Some(id) if !id.is_empty() => Ok(ComponentAction::GiveawayJoin {
                    giveaway_id: id.to_string(),
                }),
                _ => Err(UnknownComponent(custom_id.to_string())),
            },
        }
    }
}

impl fmt::Display for ComponentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentAction::TicketOpen => f.write_str(TICKET_OPEN),
            ComponentAction::TicketClaim => f.write_str(TICKET_CLAIM),
            ComponentAction::TicketClose => f.write_str(TICKET_CLOSE),
            ComponentAction::TicketTranscript => f.write_str(TICKET_TRANSCRIPT),
            ComponentAction::GiveawayJoin { giveaway_id } => {
                write!(f, "{}{}", GIVEAWAY_JOIN_PREFIX, giveaway_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ticket_actions() {
        assert_eq!("ticket:claim".parse(), Ok(ComponentAction::TicketClaim));
        assert_eq!("ticket:close".parse(), Ok(ComponentAction::TicketClose));
        assert_eq!(
            "ticket:transcript".parse(),
            Ok(ComponentAction::TicketTranscript)
        );
        assert_eq!("ticket:open".parse(), Ok(ComponentAction::TicketOpen));
    }

    #[test]
    fn test_decode_giveaway_join() {
        let action: ComponentAction = "giveaway:join:1700000000-2".parse().unwrap();
        assert_eq!(
            action,
            ComponentAction::GiveawayJoin {
                giveaway_id: "1700000000-2".to_string()
            }
        );
        assert_eq!(action.to_string(), "giveaway:join:1700000000-2");
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        assert!("giveaway:join:".parse::<ComponentAction>().is_err());
        assert!("config_global".parse::<ComponentAction>().is_err());
        assert!("ticket:reopen".parse::<ComponentAction>().is_err());
    }
}
