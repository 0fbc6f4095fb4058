use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DateEntry, DateEntryUpdate, DateStatus};
use crate::ports::DateStore;

const DATE_ENTRY_COLUMNS: &str = "id, user_from, user_to, date, time, \
     user_from_approved, user_to_approved, location_metadata, status, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgDateStore {
    pool: PgPool,
}

impl PgDateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DateStore for PgDateStore {
    async fn get(&self, id: Uuid) -> Result<Option<DateEntry>> {
        let entry = sqlx::query_as::<_, DateEntry>(&format!(
            "SELECT {DATE_ENTRY_COLUMNS} FROM date_entries WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn create(&self, user_from: &str, user_to: &str, date: NaiveDate) -> Result<DateEntry> {
        // Proposer approves their own proposal; the other side starts out
        // unapproved and the entry unscheduled.
        let entry = sqlx::query_as::<_, DateEntry>(&format!(
            "INSERT INTO date_entries (user_from, user_to, date, user_from_approved) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING {DATE_ENTRY_COLUMNS}",
        ))
        .bind(user_from)
        .bind(user_to)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn update(
        &self,
        id: Uuid,
        update: &DateEntryUpdate,
        status: DateStatus,
    ) -> Result<Option<DateEntry>> {
        let entry = sqlx::query_as::<_, DateEntry>(&format!(
            "UPDATE date_entries \
             SET time = COALESCE($2, time), \
                 location_metadata = COALESCE($3, location_metadata), \
                 user_from_approved = COALESCE($4, user_from_approved), \
                 user_to_approved = COALESCE($5, user_to_approved), \
                 status = $6, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DATE_ENTRY_COLUMNS}",
        ))
        .bind(id)
        .bind(&update.time)
        .bind(&update.location_metadata)
        .bind(update.user_from_approved)
        .bind(update.user_to_approved)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}
