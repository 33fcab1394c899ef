/// HTTP API error types
///
/// Every failure leaves the service as a `{ "success": false, "error": ... }`
/// envelope with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request identifiers
    #[error("{0}")]
    BadRequest(String),

    /// Missing API secret or bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// `site_uuid` and `api_secret` do not jointly match a project.
    /// Reported as 400 so callers cannot tell which half was wrong.
    #[error("Invalid project credentials")]
    InvalidCredentials,

    /// Absent resource, or a resource that belongs to another project
    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; the source is logged, never returned
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a storage error to `Conflict` when it is a unique-constraint violation
    pub fn conflict_or_internal(err: anyhow::Error, message: impl Into<String>) -> Self {
        let unique_violation = err
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        if unique_violation {
            ApiError::Conflict(message.into())
        } else {
            ApiError::Internal(err)
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(source) = &self {
            tracing::error!("❌ Internal error: {:#}", source);
        }

        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_wire_contract() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("disk on fire")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_their_source() {
        let err = ApiError::Internal(anyhow::anyhow!("SELECT * FROM secrets failed"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = ApiError::conflict_or_internal(anyhow::anyhow!("boom"), "duplicate");
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
