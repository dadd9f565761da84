use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub user_id: String,
    pub stars: u8,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Member reviews of one guild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildReviews {
    pub reviews: Vec<Review>,
}

impl GuildReviews {
    /// Average star rating and review count, None when there are no reviews
    pub fn summary(&self) -> Option<(f64, usize)> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: u32 = self.reviews.iter().map(|r| r.stars as u32).sum();
        Some((total as f64 / self.reviews.len() as f64, self.reviews.len()))
    }
}

/// Five-slot star bar, e.g. "⭐⭐⭐☆☆"
pub fn star_bar(stars: u8) -> String {
    let stars = stars.min(5) as usize;
    format!("{}{}", "⭐".repeat(stars), "☆".repeat(5 - stars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(stars: u8) -> Review {
        Review {
            user_id: "1".to_string(),
            stars,
            description: "ok".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary() {
        let mut reviews = GuildReviews::default();
        assert!(reviews.summary().is_none());
        reviews.reviews.extend([review(5), review(4), review(4)]);
        let (avg, count) = reviews.summary().unwrap();
        assert_eq!(count, 3);
        assert!((avg - 4.333).abs() < 0.01);
    }

    #[test]
    fn test_star_bar() {
        assert_eq!(star_bar(3), "⭐⭐⭐☆☆");
        assert_eq!(star_bar(9), "⭐⭐⭐⭐⭐");
    }
}
