use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "date_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Unscheduled,
    Pending,
    Completed,
    Cancelled,
}

impl DateStatus {
    /// Cancelled and completed entries accept no further updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DateStatus::Cancelled | DateStatus::Completed)
    }
}

/// A proposed meeting between two matched users. `status` is derived from
/// the two approval flags on every update; it is only ever set directly on
/// creation (`unscheduled`) or by an explicit cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DateEntry {
    pub id: Uuid,
    pub user_from: String,
    pub user_to: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub user_from_approved: bool,
    pub user_to_approved: bool,
    pub location_metadata: Option<serde_json::Value>,
    pub status: DateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update to a date entry. Absent approval fields default to the
/// existing record's values when the next status is resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateEntryUpdate {
    pub time: Option<String>,
    pub location_metadata: Option<serde_json::Value>,
    pub user_from_approved: Option<bool>,
    pub user_to_approved: Option<bool>,
    pub status: Option<DateStatus>,
}
