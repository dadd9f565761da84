use std::time::Duration;

use tracing::warn;

/// Discord hands out at most this many messages per history request
pub const MAX_TRANSCRIPT_LIMIT: usize = 100;

/// Runtime settings read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the per-concern JSON documents
    pub data_path: String,

    /// How long a closed ticket channel survives before the sweep deletes it
    pub ticket_delete_after: chrono::Duration,

    pub ticket_sweep_interval: Duration,
    pub giveaway_sweep_interval: Duration,
    pub ban_sweep_interval: Duration,

    /// Number of non-bot messages kept in a ticket transcript
    pub transcript_limit: usize,

    /// Capacity of the recent-message ring used by the event log
    pub message_cache_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: "data".to_string(),
            ticket_delete_after: chrono::Duration::hours(24),
            ticket_sweep_interval: Duration::from_secs(60),
            giveaway_sweep_interval: Duration::from_secs(30),
            ban_sweep_interval: Duration::from_secs(60),
            transcript_limit: 100,
            message_cache_size: 2000,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let secs = |key: &str, default: u64| -> u64 {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(value) if value > 0 => value,
                    _ => {
                        warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                        default
                    }
                },
                None => default,
            }
        };

        let default_delete_after = defaults.ticket_delete_after;
        let raw_delete_after = secs(
            "TICKET_DELETE_AFTER_SECS",
            default_delete_after.num_seconds().max(0) as u64,
        );
        let ticket_delete_after = i64::try_from(raw_delete_after)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| {
                warn!(
                    "TICKET_DELETE_AFTER_SECS={} is out of range, using {}",
                    raw_delete_after,
                    default_delete_after.num_seconds()
                );
                default_delete_after
            });

        let mut transcript_limit = secs("TRANSCRIPT_LIMIT", defaults.transcript_limit as u64);
        if transcript_limit > MAX_TRANSCRIPT_LIMIT as u64 {
            warn!(
                "TRANSCRIPT_LIMIT={} is above {}, clamping",
                transcript_limit, MAX_TRANSCRIPT_LIMIT
            );
            transcript_limit = MAX_TRANSCRIPT_LIMIT as u64;
        }

        Self {
            data_path: lookup("DATA_PATH").unwrap_or(defaults.data_path),
            ticket_delete_after,
            ticket_sweep_interval: Duration::from_secs(secs(
                "TICKET_SWEEP_SECS",
                defaults.ticket_sweep_interval.as_secs(),
            )),
            giveaway_sweep_interval: Duration::from_secs(secs(
                "GIVEAWAY_SWEEP_SECS",
                defaults.giveaway_sweep_interval.as_secs(),
            )),
            ban_sweep_interval: Duration::from_secs(secs(
                "BAN_SWEEP_SECS",
                defaults.ban_sweep_interval.as_secs(),
            )),
            transcript_limit: transcript_limit as usize,
            message_cache_size: secs("MESSAGE_CACHE_SIZE", defaults.message_cache_size as u64)
                as usize,
        }
    }

    /// Path of a concern's JSON document inside the data directory
    pub fn document_path(&self, name: &str) -> String {
        format!("{}/{}.json", self.data_path, name)
    }
}
