//! Engine handlers

use super::{parse_id, ApiResult};
use crate::AppState;
use airfleet_core::SyncReport;
use axum::{
    extract::{Path, State},
    Json,
};

/// Delete an engine; the aircraft listing it keeps the stale reference
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    let id = parse_id(&id)?;
    let report = state.sync.delete_engine(id, &state.deadline()).await?;
    Ok(Json(report))
}
