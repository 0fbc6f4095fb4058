use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::{AppState, Rejection, reject};
use crate::error::CoreError;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user_id: String,
    pub token_balance: i64,
}

/// Registers a user and issues the initial token grant. Re-registering an
/// existing user is a no-op that reports the current balance.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), Rejection> {
    if req.user_id.is_empty() {
        return Err(reject(CoreError::validation("user_id is required.")));
    }

    let newly_created = state
        .users
        .register_user(&req.user_id, req.display_name.as_deref())
        .await
        .map_err(|e| reject(CoreError::Internal(e)))?;

    if newly_created {
        state
            .ledger
            .grant_initial_tokens(&req.user_id)
            .await
            .map_err(reject)?;
    }

    let balance = state.ledger.balance(&req.user_id).await.map_err(reject)?;

    let status = if newly_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(CreateUserResponse {
            user_id: req.user_id,
            token_balance: balance,
        }),
    ))
}
