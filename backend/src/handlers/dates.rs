use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, Rejection, reject};
use crate::models::{DateEntry, DateEntryUpdate};

#[derive(Debug, Deserialize)]
pub struct ProposeDateRequest {
    pub user_from: String,
    pub user_to: String,
    pub date: String,
}

pub async fn propose_date(
    State(state): State<AppState>,
    Json(req): Json<ProposeDateRequest>,
) -> Result<(StatusCode, Json<DateEntry>), Rejection> {
    let entry = state
        .scheduler
        .propose(&req.user_from, &req.user_to, &req.date)
        .await
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_date(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DateEntry>, Rejection> {
    let entry = state.scheduler.get(id).await.map_err(reject)?;

    Ok(Json(entry))
}

pub async fn update_date(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DateEntryUpdate>,
) -> Result<Json<DateEntry>, Rejection> {
    let entry = state.scheduler.update(id, update).await.map_err(reject)?;

    Ok(Json(entry))
}
