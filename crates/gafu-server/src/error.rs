//! Server-specific error types

use crate::api::response::ErrorResponse;
use crate::features::genome_annotation::GenomeAnnotationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Result type alias for HTTP handlers
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller supplied missing or malformed parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// An object store, blob store, fetch, transform or packaging call failed
    #[error("Collaborator error: {0:#}")]
    Collaborator(anyhow::Error),
}

impl From<GenomeAnnotationError> for AppError {
    fn from(err: GenomeAnnotationError) -> Self {
        match err {
            GenomeAnnotationError::Collaborator(e) => AppError::Collaborator(e),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            AppError::Collaborator(e) => {
                tracing::error!(error = ?e, "Collaborator call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "COLLABORATOR_ERROR", format!("{:#}", e))
            },
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        let err: AppError = GenomeAnnotationError::WorkspaceNameRequired.into();
        assert!(matches!(err, AppError::Validation(ref m) if m == "workspace_name field was not defined"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_collaborator_errors_map_to_server_error() {
        let err: AppError =
            GenomeAnnotationError::Collaborator(anyhow::anyhow!("workspace unavailable")).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
