pub mod bypass;
pub mod event_log;
pub mod giveaways;
pub mod moderation;
pub mod reviews;
pub mod stats;
pub mod tickets;
pub mod voice;
pub mod welcome;

pub use bypass::BypassManager;
pub use event_log::{post_log, EventLogger};
pub use giveaways::{GiveawayManager, NewGiveaway};
pub use moderation::{ModRequest, ModerationManager};
pub use reviews::ReviewManager;
pub use stats::GuildStats;
pub use tickets::{Actor, TicketManager};
pub use voice::VoiceManager;
pub use welcome::WelcomeManager;
