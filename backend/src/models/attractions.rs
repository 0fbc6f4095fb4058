use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A directed expression of interest from `user_from` to `user_to` for one
/// calendar date. The (user_from, user_to, date) triple is the natural key
/// and never changes after creation; ratings and flags may be rewritten by
/// later submissions. `result` and `first_message_rights` are owned by the
/// matcher and are never taken from user input.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attraction {
    pub id: Uuid,
    pub user_from: String,
    pub user_to: String,
    pub date: NaiveDate,
    pub romantic_rating: i16,
    pub sexual_rating: i16,
    pub friendship_rating: i16,
    pub long_term_potential: bool,
    pub intellectual: bool,
    pub emotional: bool,
    pub result: Option<bool>,
    pub first_message_rights: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attraction {
    /// Sum of the three ratings, used both for token cost and for the
    /// first-message-rights comparison.
    pub fn total_interest(&self) -> i64 {
        self.romantic_rating as i64 + self.sexual_rating as i64 + self.friendship_rating as i64
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AttractionRatings {
    pub romantic: i16,
    pub sexual: i16,
    pub friendship: i16,
}

impl AttractionRatings {
    pub fn new(romantic: i16, sexual: i16, friendship: i16) -> Self {
        Self {
            romantic,
            sexual,
            friendship,
        }
    }

    pub fn total(&self) -> i64 {
        self.romantic as i64 + self.sexual as i64 + self.friendship as i64
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AttractionFlags {
    #[serde(default)]
    pub long_term_potential: bool,
    #[serde(default)]
    pub intellectual: bool,
    #[serde(default)]
    pub emotional: bool,
}

/// Match outcome written back to a directed record by the matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttractionOutcome {
    pub result: Option<bool>,
    pub first_message_rights: Option<bool>,
}
