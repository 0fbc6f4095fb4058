//! Store and collaborator interfaces consumed by the core services.
//!
//! Services are built over these traits rather than concrete Postgres
//! clients so the engine can be exercised with in-memory doubles and so no
//! service reaches for a hidden global. Port errors are infrastructure
//! errors (`anyhow`); business rejections are decided by the services.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Attraction, AttractionFlags, AttractionOutcome, AttractionRatings, DateEntry, DateEntryUpdate,
    DateStatus, NewTransaction, Transaction,
};

/// Append-only storage of token transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, tx: NewTransaction) -> Result<Transaction>;

    /// Sum of `token_amount` over every transaction of the user. Balances
    /// are always derived from this sum; there is no cached balance column.
    async fn sum_by_user(&self, user_id: &str) -> Result<i64>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Transaction>>;
}

/// Keyed storage of directed attraction records.
#[async_trait]
pub trait AttractionStore: Send + Sync {
    async fn get(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
    ) -> Result<Option<Attraction>>;

    async fn create(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Attraction>;

    /// Overwrites rating and flag fields only; identity and match outcome
    /// are untouched. Returns None if the record no longer exists.
    async fn update_ratings(
        &self,
        id: Uuid,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Option<Attraction>>;

    /// Writes the matcher-owned outcome fields.
    async fn set_outcome(&self, id: Uuid, outcome: AttractionOutcome) -> Result<Option<Attraction>>;

    async fn list_between(&self, user_from: &str, user_to: &str) -> Result<Vec<Attraction>>;
}

/// Storage of scheduled date entries.
#[async_trait]
pub trait DateStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<DateEntry>>;

    async fn create(&self, user_from: &str, user_to: &str, date: NaiveDate) -> Result<DateEntry>;

    async fn update(
        &self,
        id: Uuid,
        update: &DateEntryUpdate,
        status: DateStatus,
    ) -> Result<Option<DateEntry>>;
}

/// User listing consumed only by the monthly replenishment batch.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_all_user_ids(&self) -> Result<Vec<String>>;
}

/// Outbound match notifications. Callers treat delivery as fire-and-forget:
/// a failure here is logged, never propagated.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send_match(&self, user_a: &str, user_b: &str) -> Result<()>;
}
