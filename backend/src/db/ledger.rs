use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{NewTransaction, Transaction};
use crate::ports::LedgerStore;

/// Postgres-backed transaction ledger. The table is append-only; nothing in
/// this module issues an UPDATE or DELETE.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn append(&self, tx: NewTransaction) -> Result<Transaction> {
        let created = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (user_id, transaction_type, token_amount, description,
                 related_entity_id, related_entity_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, transaction_type, token_amount, description,
                      related_entity_id, related_entity_type, created_at
            "#,
        )
        .bind(&tx.user_id)
        .bind(tx.transaction_type)
        .bind(tx.token_amount)
        .bind(&tx.description)
        .bind(&tx.related_entity_id)
        .bind(&tx.related_entity_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn sum_by_user(&self, user_id: &str) -> Result<i64> {
        let sum = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT SUM(token_amount) FROM transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, transaction_type, token_amount, description,
                   related_entity_id, related_entity_type, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}
