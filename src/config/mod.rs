pub mod guild;
pub mod settings;

pub use guild::{LogKind, LogsConfig, TicketCategory, TicketConfig, WelcomeConfig, WELCOME_PLACEHOLDER};
pub use settings::Settings;
