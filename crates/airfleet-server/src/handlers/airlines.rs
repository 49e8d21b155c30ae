//! Airline handlers

use super::{parse_id, ApiResult, IdRequest, IdsRequest};
use crate::AppState;
use airfleet_core::{Aircraft, FleetError, SyncReport, User};
use axum::{
    extract::{Path, State},
    Json,
};

/// Detach from owner and fleet, then delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    let id = parse_id(&id)?;
    let report = state.sync.delete_airline(id, &state.deadline()).await?;
    Ok(Json(report))
}

pub async fn update_fleet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let airline = parse_id(&id)?;
    let aircraft = req.parse()?;
    let report = state
        .sync
        .update_fleet(airline, &aircraft, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn update_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdRequest>,
) -> ApiResult<Json<SyncReport>> {
    let airline = parse_id(&id)?;
    let Some(user) = req.parse()? else {
        return Err(FleetError::InvalidRequest("owner id is required".to_string()).into());
    };
    let report = state
        .sync
        .update_airline_owner(airline, user, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn update_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let airline = parse_id(&id)?;
    let reviews = req.parse()?;
    let report = state
        .sync
        .update_reviews(airline, &reviews, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn update_routes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let airline = parse_id(&id)?;
    let routes = req.parse()?;
    let report = state
        .sync
        .update_routes(airline, &routes, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn fleet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Aircraft>>> {
    let id = parse_id(&id)?;
    let fleet = state.navigator.airline_fleet(id, &state.deadline()).await?;
    Ok(Json(fleet))
}

pub async fn owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<User>>> {
    let id = parse_id(&id)?;
    let user = state.navigator.airline_owner(id, &state.deadline()).await?;
    Ok(Json(user))
}
