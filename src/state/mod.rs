pub mod bypass;
pub mod giveaways;
pub mod message_cache;
pub mod moderation;
pub mod reviews;
pub mod store;
pub mod tickets;
pub mod voice;

pub use bypass::GuildBypass;
pub use giveaways::{GiveawayRecord, GuildGiveaways, JoinOutcome};
pub use message_cache::{create_message_cache, CachedMessage, MessageCache, SharedMessageCache};
pub use moderation::{ModerationLog, SanctionEntry, WarnEntry};
pub use reviews::{GuildReviews, Review};
pub use store::{open_shared_store, GuildStore, SharedStore};
pub use tickets::{GuildTickets, TicketRecord, TicketState, TransitionError};
pub use voice::{CloneRecord, GuildVoice, HubConfig};

use crate::config::{LogsConfig, Settings, WelcomeConfig};
use crate::error::Result;

/// Every persisted document, one per concern
#[derive(Clone)]
pub struct Stores {
    pub tickets: SharedStore<GuildTickets>,
    pub giveaways: SharedStore<GuildGiveaways>,
    pub moderation: SharedStore<ModerationLog>,
    pub welcome: SharedStore<Option<WelcomeConfig>>,
    pub logs: SharedStore<LogsConfig>,
    pub bypass: SharedStore<GuildBypass>,
    pub voice: SharedStore<GuildVoice>,
    pub reviews: SharedStore<GuildReviews>,
}

impl Stores {
    pub async fn open(settings: &Settings) -> Result<Self> {
        Ok(Self {
            tickets: open_shared_store(&settings.document_path("tickets")).await?,
            giveaways: open_shared_store(&settings.document_path("giveaways")).await?,
            moderation: open_shared_store(&settings.document_path("moderation")).await?,
            welcome: open_shared_store(&settings.document_path("welcome")).await?,
            logs: open_shared_store(&settings.document_path("logs_config")).await?,
            bypass: open_shared_store(&settings.document_path("bypass")).await?,
            voice: open_shared_store(&settings.document_path("voice_config")).await?,
            reviews: open_shared_store(&settings.document_path("reviews")).await?,
        })
    }
}
