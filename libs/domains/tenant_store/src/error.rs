use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantStoreError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Vector backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding component {index} is not a finite number")]
    NonFiniteEmbedding { index: usize },

    #[error("Document '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TenantStoreResult<T> = Result<T, TenantStoreError>;

impl From<qdrant_client::QdrantError> for TenantStoreError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        TenantStoreError::BackendUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for TenantStoreError {
    fn from(err: reqwest::Error) -> Self {
        TenantStoreError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for TenantStoreError {
    fn from(err: serde_json::Error) -> Self {
        TenantStoreError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert TenantStoreError to AppError for standardized HTTP error responses
impl From<TenantStoreError> for AppError {
    fn from(err: TenantStoreError) -> Self {
        match err {
            TenantStoreError::InvalidIdentifier(_) | TenantStoreError::InvalidQuery(_) => {
                AppError::BadRequest(err.to_string())
            }
            TenantStoreError::DimensionMismatch { .. }
            | TenantStoreError::NonFiniteEmbedding { .. } => {
                AppError::UnprocessableEntity(err.to_string())
            }
            TenantStoreError::DuplicateId { .. } => AppError::Conflict(err.to_string()),
            TenantStoreError::BackendUnavailable(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            TenantStoreError::Embedding(_)
            | TenantStoreError::Config(_)
            | TenantStoreError::Internal(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl IntoResponse for TenantStoreError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: TenantStoreError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(TenantStoreError::InvalidIdentifier("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TenantStoreError::InvalidQuery("k".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TenantStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(TenantStoreError::NonFiniteEmbedding { index: 0 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(TenantStoreError::DuplicateId {
                collection: "tenant_a_docs".into(),
                id: "a1".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TenantStoreError::BackendUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(TenantStoreError::Embedding("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = TenantStoreError::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: expected 384, got 3"
        );
    }
}
