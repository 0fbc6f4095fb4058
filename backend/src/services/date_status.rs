use std::sync::Arc;

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{DateEntry, DateEntryUpdate, DateStatus};
use crate::ports::DateStore;

/// Computes the next status of a date entry from its current state and a
/// partial update. Pure: no store access, no clock.
///
/// An explicit cancellation wins over everything else and is terminal.
/// Otherwise approvals missing from the update fall back to the existing
/// record's values: both approved is `completed`, exactly one is `pending`,
/// neither leaves the status unchanged.
pub fn resolve_status(existing: &DateEntry, update: &DateEntryUpdate) -> DateStatus {
    if update.status == Some(DateStatus::Cancelled) {
        return DateStatus::Cancelled;
    }

    let from_approved = update
        .user_from_approved
        .unwrap_or(existing.user_from_approved);
    let to_approved = update.user_to_approved.unwrap_or(existing.user_to_approved);

    match (from_approved, to_approved) {
        (true, true) => DateStatus::Completed,
        (false, false) => existing.status,
        _ => DateStatus::Pending,
    }
}

/// Store-facing wrapper around `resolve_status`: creation and the guarded
/// update path for date entries.
pub struct DateScheduler {
    dates: Arc<dyn DateStore>,
}

impl DateScheduler {
    pub fn new(dates: Arc<dyn DateStore>) -> Self {
        Self { dates }
    }

    /// Creates a proposal. New entries always start `unscheduled` with the
    /// proposer auto-approved; status is never routed through the resolver
    /// on creation.
    pub async fn propose(
        &self,
        user_from: &str,
        user_to: &str,
        date: &str,
    ) -> CoreResult<DateEntry> {
        if user_from == user_to {
            return Err(CoreError::validation("Cannot propose a date with oneself."));
        }
        let date = date
            .parse()
            .map_err(|_| CoreError::validation("Date must be YYYY-MM-DD."))?;
        Ok(self.dates.create(user_from, user_to, date).await?)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<DateEntry> {
        self.dates
            .get(id)
            .await?
            .ok_or_else(|| CoreError::NotFound("date entry".to_string()))
    }

    /// Applies a partial update, deriving the new status via
    /// `resolve_status`. Terminal entries reject further changes; re-sending
    /// a cancellation to an already-cancelled entry is a no-op.
    pub async fn update(&self, id: Uuid, update: DateEntryUpdate) -> CoreResult<DateEntry> {
        let existing = self
            .dates
            .get(id)
            .await?
            .ok_or_else(|| CoreError::NotFound("date entry".to_string()))?;

        if existing.status.is_terminal() {
            if existing.status == DateStatus::Cancelled
                && update.status == Some(DateStatus::Cancelled)
            {
                return Ok(existing);
            }
            return Err(CoreError::validation(format!(
                "Cannot update a date that is already {:?}.",
                existing.status
            )));
        }

        let next_status = resolve_status(&existing, &update);
        let updated = self
            .dates
            .update(id, &update, next_status)
            .await?
            .ok_or_else(|| CoreError::NotFound("date entry".to_string()))?;

        tracing::debug!(id = %id, status = ?updated.status, "date entry updated");
        Ok(updated)
    }
}
