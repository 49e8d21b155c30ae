//! Aircraft handlers

use super::{parse_id, ApiResult, IdRequest, IdsRequest};
use crate::AppState;
use airfleet_core::{Aircraft, Airline, Engine, EntityKind, FleetError, SyncReport, User};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    name: String,
}

/// Aircraft whose general name matches exactly; none at all is a 404
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Aircraft>>> {
    if query.name.is_empty() {
        return Err(FleetError::InvalidRequest("name must not be empty".to_string()).into());
    }
    let found = state
        .repos
        .aircraft
        .list_where("general.name", &query.name, &state.deadline())
        .await?;
    if found.is_empty() {
        return Err(FleetError::NotFound {
            kind: EntityKind::Aircraft,
            id: query.name,
        }
        .into());
    }
    Ok(Json(found))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    let id = parse_id(&id)?;
    let report = state.sync.delete_aircraft(id, &state.deadline()).await?;
    Ok(Json(report))
}

pub async fn update_engines(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let aircraft = parse_id(&id)?;
    let engines = req.parse()?;
    let report = state
        .sync
        .update_engines(aircraft, &engines, &state.deadline())
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    #[serde(default)]
    tags: Vec<String>,
}

pub async fn update_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TagsRequest>,
) -> ApiResult<Json<SyncReport>> {
    let aircraft = parse_id(&id)?;
    let report = state
        .sync
        .update_tags(aircraft, &req.tags, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn update_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IdRequest>,
) -> ApiResult<Json<SyncReport>> {
    let aircraft = parse_id(&id)?;
    let owner = req.parse()?;
    let report = state
        .sync
        .update_aircraft_owner(aircraft, owner, &state.deadline())
        .await?;
    Ok(Json(report))
}

pub async fn engines(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Engine>>> {
    let id = parse_id(&id)?;
    let engines = state.navigator.aircraft_engines(id, &state.deadline()).await?;
    Ok(Json(engines))
}

/// Current operator: the last airline in the aircraft's history
pub async fn operator(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Airline>>> {
    let id = parse_id(&id)?;
    let airline = state.navigator.aircraft_operator(id, &state.deadline()).await?;
    Ok(Json(airline))
}

pub async fn owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<User>>> {
    let id = parse_id(&id)?;
    let user = state.navigator.aircraft_owner(id, &state.deadline()).await?;
    Ok(Json(user))
}
