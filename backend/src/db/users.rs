use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::ports::UserDirectory;

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a user id if it is not already present. Returns true when a
    /// new row was inserted, so the caller knows whether to issue the
    /// initial token grant.
    pub async fn register_user(&self, user_id: &str, display_name: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, display_name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn list_all_user_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
