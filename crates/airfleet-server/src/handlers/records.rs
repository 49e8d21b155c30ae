//! CRUD handlers shared by every record kind

use super::{parse_id, ApiResult};
use crate::AppState;
use airfleet_core::{
    Aircraft, Airline, Engine, Flight, Record, Repository, Review, Route, User,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Picks the repository for a record kind out of the shared state
pub trait Collection: Record {
    fn repo(state: &AppState) -> &Arc<Repository<Self>>;
}

macro_rules! collection {
    ($ty:ty, $field:ident) => {
        impl Collection for $ty {
            fn repo(state: &AppState) -> &Arc<Repository<Self>> {
                &state.repos.$field
            }
        }
    };
}

collection!(Aircraft, aircraft);
collection!(Engine, engines);
collection!(Airline, airlines);
collection!(User, users);
collection!(Flight, flights);
collection!(Route, routes);
collection!(Review, reviews);

pub async fn list<T: Collection>(State(state): State<AppState>) -> ApiResult<Json<Vec<T>>> {
    let records = T::repo(&state).list(&state.deadline()).await?;
    Ok(Json(records))
}

pub async fn get<T: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<T>> {
    let id = parse_id(&id)?;
    let record = T::repo(&state).get(id, &state.deadline()).await?;
    Ok(Json(record))
}

pub async fn create<T: Collection>(
    State(state): State<AppState>,
    Json(record): Json<T>,
) -> ApiResult<(StatusCode, Json<T>)> {
    let created = T::repo(&state).insert(record, &state.deadline()).await?;
    tracing::info!("Created {} {:?}", T::KIND, created.id());
    Ok((StatusCode::CREATED, Json(created)))
}

/// Set-if-present update; empty strings and nulls leave fields unchanged
pub async fn patch<T: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> ApiResult<Json<T>> {
    let id = parse_id(&id)?;
    let updated = T::repo(&state).patch(id, fields, &state.deadline()).await?;
    Ok(Json(updated))
}

/// Delete for kinds nothing else detaches from
pub async fn delete<T: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    match T::repo(&state).delete(id, &state.deadline()).await? {
        0 => Err(airfleet_core::FleetError::not_found(T::KIND, id).into()),
        _ => {
            tracing::info!("Deleted {} {}", T::KIND, id);
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
