//! User handlers

use super::{parse_id, ApiResult, IdsRequest};
use crate::AppState;
use airfleet_core::{Airline, SyncReport, User};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    airline: String,
}

/// Users whose airlines include the given one
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let airline = parse_id(&query.airline)?;
    let users = state
        .repos
        .users
        .list_where("airlines", &airline.to_string(), &state.deadline())
        .await?;
    Ok(Json(users))
}

/// Delete the user along with every airline they own
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    let id = parse_id(&id)?;
    let report = state.sync.delete_user(id, &state.deadline()).await?;
    Ok(Json(report))
}

pub async fn update_airlines(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let user = parse_id(&id)?;
    let airlines = req.parse()?;
    let report = state
        .sync
        .update_user_airlines(user, &airlines, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn airlines(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Airline>>> {
    let id = parse_id(&id)?;
    let airlines = state.navigator.user_airlines(id, &state.deadline()).await?;
    Ok(Json(airlines))
}
