use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::{AppState, Rejection, reject};
use crate::models::Transaction;
use crate::services::ReplenishmentReport;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: i64,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, Rejection> {
    let balance = state.ledger.balance(&user_id).await.map_err(reject)?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, Rejection> {
    let transactions = state
        .ledger
        .transactions_for_user(&user_id)
        .await
        .map_err(reject)?;

    Ok(Json(transactions))
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub token_amount: i64,
    pub description: String,
}

pub async fn purchase_tokens(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<Transaction>, Rejection> {
    let tx = state
        .ledger
        .purchase_tokens(&user_id, req.token_amount, &req.description)
        .await
        .map_err(reject)?;

    Ok(Json(tx))
}

/// Operator endpoint backing the monthly replenishment job. Per-user
/// failures are absorbed into the report, so this responds 200 even when
/// some users failed.
pub async fn replenish_all_users(
    State(state): State<AppState>,
) -> Result<Json<ReplenishmentReport>, Rejection> {
    let report = state.ledger.replenish_all_users().await.map_err(reject)?;

    Ok(Json(report))
}
