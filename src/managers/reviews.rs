use chrono::{DateTime, Utc};
use poise::serenity_prelude::{GuildId, UserId};
use tracing::info;

use crate::error::{BotError, Result};
use crate::state::{GuildReviews, Review, SharedStore};

pub struct ReviewManager {
    store: SharedStore<GuildReviews>,
}

impl ReviewManager {
    pub fn new(store: SharedStore<GuildReviews>) -> Self {
        Self { store }
    }

    pub async fn add(
        &self,
        guild: GuildId,
        user: UserId,
        stars: u8,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<Review> {
        if !(1..=5).contains(&stars) {
            return Err(BotError::validation("The rating must be between 1 and 5 stars."));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(BotError::validation("Please describe your experience."));
        }

        let review = Review {
            user_id: user.to_string(),
            stars,
            description: description.to_string(),
            created_at: now,
        };
        let stored = review.clone();
        self.store
            .update(&guild.to_string(), |reviews| reviews.reviews.push(stored))
            .await?;
        info!("New {}-star review from {} in guild {}", stars, user, guild);
        Ok(review)
    }

    /// Average rating and number of reviews, None when there are none
    pub async fn summary(&self, guild: GuildId) -> Option<(f64, usize)> {
        self.store.get(&guild.to_string()).await.summary()
    }
}
