use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    InitialGrant,
    Purchase,
    Deduction,
    Replenishment,
    MonthlyExpiry,
}

/// A single ledger entry. Rows are append-only: once written they are never
/// updated or deleted, and a user's balance is always the sum of their
/// `token_amount` column (positive = credit, negative = debit).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub token_amount: i64,
    pub description: String,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending a ledger entry. The id and timestamp are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub token_amount: i64,
    pub description: String,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}

impl NewTransaction {
    pub fn new(
        user_id: &str,
        transaction_type: TransactionType,
        token_amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            transaction_type,
            token_amount,
            description: description.into(),
            related_entity_id: None,
            related_entity_type: None,
        }
    }
}
