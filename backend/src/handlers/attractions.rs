use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::{AppState, Rejection, reject};
use crate::models::{Attraction, AttractionFlags, AttractionRatings};

#[derive(Debug, Deserialize)]
pub struct UpsertAttractionRequest {
    pub user_from: String,
    pub user_to: String,
    pub date: String,
    #[serde(default)]
    pub romantic_rating: i16,
    #[serde(default)]
    pub sexual_rating: i16,
    #[serde(default)]
    pub friendship_rating: i16,
    #[serde(flatten)]
    pub flags: AttractionFlags,
}

#[derive(Debug, Serialize)]
pub struct UpsertAttractionResponse {
    pub attraction: Attraction,
    pub is_match: bool,
}

pub async fn upsert_attraction(
    State(state): State<AppState>,
    Json(req): Json<UpsertAttractionRequest>,
) -> Result<(StatusCode, Json<UpsertAttractionResponse>), Rejection> {
    let ratings = AttractionRatings::new(
        req.romantic_rating,
        req.sexual_rating,
        req.friendship_rating,
    );

    let outcome = state
        .matcher
        .upsert(&req.user_from, &req.user_to, &req.date, ratings, req.flags)
        .await
        .map_err(reject)?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(UpsertAttractionResponse {
            attraction: outcome.attraction,
            is_match: outcome.is_match,
        }),
    ))
}

pub async fn get_attraction(
    State(state): State<AppState>,
    Path((user_from, user_to, date)): Path<(String, String, String)>,
) -> Result<Json<Attraction>, Rejection> {
    let attraction = state
        .matcher
        .attraction(&user_from, &user_to, &date)
        .await
        .map_err(reject)?;

    Ok(Json(attraction))
}

pub async fn list_attractions(
    State(state): State<AppState>,
    Path((user_from, user_to)): Path<(String, String)>,
) -> Result<Json<Vec<Attraction>>, Rejection> {
    let attractions = state
        .matcher
        .attractions_between(&user_from, &user_to)
        .await
        .map_err(reject)?;

    Ok(Json(attractions))
}
