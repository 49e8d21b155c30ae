//! Error types for the record engine

use airfleet_types::{EntityKind, InvalidRecordId, RecordId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Malformed reference: {0}")]
    MalformedId(#[from] InvalidRecordId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Timed out during {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Partially applied after {} committed write(s): {source}", .committed.len())]
    PartialApplication {
        committed: Vec<String>,
        source: Box<FleetError>,
    },
}

impl FleetError {
    pub fn not_found(kind: EntityKind, id: RecordId) -> Self {
        FleetError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Rejected before touching the store or the cache
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FleetError::MalformedId(_) | FleetError::InvalidRequest(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound { .. })
    }

    /// Infrastructure failures a caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FleetError::Store(_) | FleetError::Cache(_) | FleetError::Timeout(_)
        )
    }

    /// The failure underneath any partial-application wrapper
    pub fn root(&self) -> &FleetError {
        match self {
            FleetError::PartialApplication { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(e: serde_json::Error) -> Self {
        FleetError::Serialization(e.to_string())
    }
}

/// Parse raw identifiers from a request; the first malformed one fails the batch
pub fn parse_ids<S: AsRef<str>>(raw: &[S]) -> Result<Vec<RecordId>> {
    Ok(RecordId::parse_all(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let malformed = FleetError::from(InvalidRecordId("x".to_string()));
        assert!(malformed.is_client_error());
        assert!(!malformed.is_retryable());

        let missing = FleetError::not_found(EntityKind::Engine, RecordId::generate());
        assert!(missing.is_not_found());
        assert!(!missing.is_client_error());

        assert!(FleetError::Cache("down".to_string()).is_retryable());
        assert!(FleetError::Timeout("update".to_string()).is_retryable());
    }

    #[test]
    fn test_partial_application_keeps_root_cause() {
        let err = FleetError::PartialApplication {
            committed: vec!["toggled airlines fleet".to_string()],
            source: Box::new(FleetError::Store("connection reset".to_string())),
        };
        assert!(err.to_string().starts_with("Partially applied after 1 committed write(s)"));
        assert!(matches!(err.root(), FleetError::Store(_)));
    }

    #[test]
    fn test_parse_ids_reports_malformed_reference() {
        let err = parse_ids(&["not-an-id"]).unwrap_err();
        assert!(matches!(err, FleetError::MalformedId(_)));
    }
}
