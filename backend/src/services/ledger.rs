use std::sync::Arc;

use serde::Serialize;

use crate::constants::{INITIAL_TOKEN_GRANT_AMOUNT, MONTHLY_REPLENISHMENT_AMOUNT};
use crate::error::{CoreError, CoreResult};
use crate::models::{NewTransaction, Transaction, TransactionType};
use crate::ports::{LedgerStore, UserDirectory};

/// Result of a monthly replenishment batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplenishmentReport {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Sole authority over a user's spendable token balance.
///
/// Balances are never stored: every read sums the user's transaction rows,
/// so the ledger cannot drift from its own history. The balance check in
/// `spend` and the subsequent append are two separate store calls with no
/// lock between them; concurrent spends for the same user can interleave in
/// that window.
pub struct TokenLedger {
    store: Arc<dyn LedgerStore>,
    users: Arc<dyn UserDirectory>,
}

impl TokenLedger {
    pub fn new(store: Arc<dyn LedgerStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    pub async fn balance(&self, user_id: &str) -> CoreResult<i64> {
        Ok(self.store.sum_by_user(user_id).await?)
    }

    pub async fn transactions_for_user(&self, user_id: &str) -> CoreResult<Vec<Transaction>> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    /// Deducts `amount` tokens from the user, rejecting with
    /// `InsufficientBalance` (and writing nothing) when the current balance
    /// cannot cover it.
    pub async fn spend(&self, user_id: &str, amount: i64, reason: &str) -> CoreResult<Transaction> {
        if amount <= 0 {
            return Err(CoreError::validation(
                "Tokens to spend must be a positive value.",
            ));
        }

        let balance = self.store.sum_by_user(user_id).await?;
        if balance < amount {
            return Err(CoreError::InsufficientBalance {
                balance,
                required: amount,
            });
        }

        let tx = self
            .store
            .append(NewTransaction::new(
                user_id,
                TransactionType::Deduction,
                -amount,
                reason,
            ))
            .await?;

        tracing::debug!(user_id, amount, reason, "tokens deducted");
        Ok(tx)
    }

    /// Credits `amount` tokens to the user. Used for refunds and other
    /// corrective grants; the reason should reference the operation being
    /// compensated.
    pub async fn grant(&self, user_id: &str, amount: i64, reason: &str) -> CoreResult<Transaction> {
        if amount <= 0 {
            return Err(CoreError::validation(
                "Tokens to grant must be a positive value.",
            ));
        }

        let tx = self
            .store
            .append(NewTransaction::new(
                user_id,
                TransactionType::Replenishment,
                amount,
                reason,
            ))
            .await?;

        tracing::debug!(user_id, amount, reason, "tokens granted");
        Ok(tx)
    }

    /// One-time grant issued when an account is created.
    pub async fn grant_initial_tokens(&self, user_id: &str) -> CoreResult<Transaction> {
        let tx = self
            .store
            .append(NewTransaction::new(
                user_id,
                TransactionType::InitialGrant,
                INITIAL_TOKEN_GRANT_AMOUNT,
                format!(
                    "Initial {INITIAL_TOKEN_GRANT_AMOUNT} token grant upon account creation."
                ),
            ))
            .await?;

        Ok(tx)
    }

    pub async fn purchase_tokens(
        &self,
        user_id: &str,
        token_amount: i64,
        description: &str,
    ) -> CoreResult<Transaction> {
        if token_amount <= 0 {
            return Err(CoreError::validation(
                "Token amount for purchase must be positive.",
            ));
        }

        let tx = self
            .store
            .append(NewTransaction::new(
                user_id,
                TransactionType::Purchase,
                token_amount,
                description,
            ))
            .await?;

        Ok(tx)
    }

    /// Expires whatever balance the user still holds, then grants the fixed
    /// monthly amount. Two transactions on purpose: netting them into one
    /// adjustment would erase the expiry from the audit history.
    pub async fn monthly_replenish(&self, user_id: &str) -> CoreResult<()> {
        let balance = self.store.sum_by_user(user_id).await?;

        if balance > 0 {
            self.store
                .append(NewTransaction::new(
                    user_id,
                    TransactionType::MonthlyExpiry,
                    -balance,
                    format!("Monthly expiry of {balance} tokens."),
                ))
                .await?;
            tracing::debug!(user_id, expired = balance, "expired monthly tokens");
        }

        self.store
            .append(NewTransaction::new(
                user_id,
                TransactionType::Replenishment,
                MONTHLY_REPLENISHMENT_AMOUNT,
                format!("Monthly replenishment of {MONTHLY_REPLENISHMENT_AMOUNT} tokens."),
            ))
            .await?;
        tracing::debug!(
            user_id,
            granted = MONTHLY_REPLENISHMENT_AMOUNT,
            "replenished monthly tokens"
        );

        Ok(())
    }

    /// Runs `monthly_replenish` for every known user. A failure for one user
    /// is counted and logged, then processing moves on; there is no rollback
    /// of users already replenished and no retry within the run.
    pub async fn replenish_all_users(&self) -> CoreResult<ReplenishmentReport> {
        tracing::info!("starting monthly token replenishment for all users");
        let mut report = ReplenishmentReport::default();

        let user_ids = self.users.list_all_user_ids().await?;
        if user_ids.is_empty() {
            tracing::info!("no users found to process for replenishment");
            return Ok(report);
        }

        for user_id in &user_ids {
            match self.monthly_replenish(user_id).await {
                Ok(()) => report.success += 1,
                Err(err) => {
                    tracing::error!(user_id, error = %err, "monthly replenishment failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            success = report.success,
            failed = report.failed,
            skipped = report.skipped,
            "monthly token replenishment completed"
        );
        Ok(report)
    }
}
