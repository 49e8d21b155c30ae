//! HTTP handlers

pub mod aircraft;
pub mod airlines;
pub mod engines;
pub mod health;
pub mod records;
pub mod users;

pub use health::health;

use airfleet_core::{parse_ids, FleetError, RecordId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

/// Engine error rendered as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub FleetError);

impl From<FleetError> for ApiError {
    fn from(e: FleetError) -> Self {
        Self(e)
    }
}

pub fn status_for(err: &FleetError) -> StatusCode {
    match err {
        FleetError::MalformedId(_) | FleetError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        FleetError::NotFound { .. } => StatusCode::NOT_FOUND,
        FleetError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FleetError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
        FleetError::Store(_)
        | FleetError::Serialization(_)
        | FleetError::PartialApplication { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        let body = match &self.0 {
            FleetError::PartialApplication { committed, .. } => {
                json!({"error": self.0.to_string(), "committed": committed})
            }
            other => json!({"error": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn parse_id(raw: &str) -> ApiResult<RecordId> {
    raw.parse::<RecordId>()
        .map_err(|e| ApiError(FleetError::from(e)))
}

/// Body of the relationship endpoints: `{"ids": [...]}`
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl IdsRequest {
    /// Every identifier parsed; one malformed entry rejects the request
    pub fn parse(&self) -> ApiResult<Vec<RecordId>> {
        Ok(parse_ids(&self.ids)?)
    }
}

/// Body of the single-reference endpoints: `{"id": ...}`, null to clear
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: Option<String>,
}

impl IdRequest {
    pub fn parse(&self) -> ApiResult<Option<RecordId>> {
        self.id.as_deref().map(parse_id).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airfleet_core::EntityKind;

    #[test]
    fn test_status_mapping() {
        let id = RecordId::generate();
        assert_eq!(
            status_for(&FleetError::InvalidRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&FleetError::not_found(EntityKind::Engine, id)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&FleetError::Timeout("update".to_string())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&FleetError::Cache("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let partial = FleetError::PartialApplication {
            committed: vec!["toggled airline fleet".to_string()],
            source: Box::new(FleetError::NotFound {
                kind: EntityKind::Aircraft,
                id: id.to_string(),
            }),
        };
        assert_eq!(status_for(&partial), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ids_request_rejects_malformed_entry() {
        let req = IdsRequest {
            ids: vec![RecordId::generate().to_string(), "abc".to_string()],
        };
        let err = req.parse().unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_id_request_null_clears() {
        let req: IdRequest = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(req.parse().unwrap(), None);
    }
}
