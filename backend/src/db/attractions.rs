use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Attraction, AttractionFlags, AttractionOutcome, AttractionRatings,
};
use crate::ports::AttractionStore;

const ATTRACTION_COLUMNS: &str = "id, user_from, user_to, date, \
     romantic_rating, sexual_rating, friendship_rating, \
     long_term_potential, intellectual, emotional, \
     result, first_message_rights, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgAttractionStore {
    pool: PgPool,
}

impl PgAttractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttractionStore for PgAttractionStore {
    async fn get(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
    ) -> Result<Option<Attraction>> {
        let attraction = sqlx::query_as::<_, Attraction>(&format!(
            "SELECT {ATTRACTION_COLUMNS} FROM attractions \
             WHERE user_from = $1 AND user_to = $2 AND date = $3",
        ))
        .bind(user_from)
        .bind(user_to)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attraction)
    }

    async fn create(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Attraction> {
        let attraction = sqlx::query_as::<_, Attraction>(&format!(
            "INSERT INTO attractions \
                 (user_from, user_to, date, romantic_rating, sexual_rating, \
                  friendship_rating, long_term_potential, intellectual, emotional) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ATTRACTION_COLUMNS}",
        ))
        .bind(user_from)
        .bind(user_to)
        .bind(date)
        .bind(ratings.romantic)
        .bind(ratings.sexual)
        .bind(ratings.friendship)
        .bind(flags.long_term_potential)
        .bind(flags.intellectual)
        .bind(flags.emotional)
        .fetch_one(&self.pool)
        .await?;

        Ok(attraction)
    }

    async fn update_ratings(
        &self,
        id: Uuid,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Option<Attraction>> {
        let attraction = sqlx::query_as::<_, Attraction>(&format!(
            "UPDATE attractions \
             SET romantic_rating = $2, sexual_rating = $3, friendship_rating = $4, \
                 long_term_potential = $5, intellectual = $6, emotional = $7, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ATTRACTION_COLUMNS}",
        ))
        .bind(id)
        .bind(ratings.romantic)
        .bind(ratings.sexual)
        .bind(ratings.friendship)
        .bind(flags.long_term_potential)
        .bind(flags.intellectual)
        .bind(flags.emotional)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attraction)
    }

    async fn set_outcome(&self, id: Uuid, outcome: AttractionOutcome) -> Result<Option<Attraction>> {
        let attraction = sqlx::query_as::<_, Attraction>(&format!(
            "UPDATE attractions \
             SET result = $2, first_message_rights = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ATTRACTION_COLUMNS}",
        ))
        .bind(id)
        .bind(outcome.result)
        .bind(outcome.first_message_rights)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attraction)
    }

    async fn list_between(&self, user_from: &str, user_to: &str) -> Result<Vec<Attraction>> {
        let attractions = sqlx::query_as::<_, Attraction>(&format!(
            "SELECT {ATTRACTION_COLUMNS} FROM attractions \
             WHERE user_from = $1 AND user_to = $2 \
             ORDER BY date DESC",
        ))
        .bind(user_from)
        .bind(user_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(attractions)
    }
}
