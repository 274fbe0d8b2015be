//! API error type and its JSON response shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hlsmith_core::{AuthError, OrchestratorError};
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Errors returned by API handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input (400).
    BadRequest(String),
    /// Missing or invalid credentials (401).
    Unauthenticated,
    /// Authenticated but not allowed (403).
    Forbidden,
    /// The transcode could not be dispatched (500).
    ProcessingFailed { details: String },
    /// Worker pool and queue are saturated (503).
    QueueFull,
    /// Unexpected server-side failure (500).
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ProcessingFailed { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(self) -> ErrorResponse {
        let (error, details) = match self {
            Self::BadRequest(message) => (message, None),
            Self::Unauthenticated | Self::Forbidden => ("Unauthorized".to_string(), None),
            Self::ProcessingFailed { details } => ("Processing failed".to_string(), Some(details)),
            Self::QueueFull => ("Transcode queue is full".to_string(), None),
            Self::Internal(details) => ("Internal server error".to_string(), Some(details)),
        };
        ErrorResponse { error, details }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated | AuthError::InvalidCredentials(_) => Self::Unauthenticated,
            AuthError::Forbidden { .. } => Self::Forbidden,
            AuthError::ServiceUnavailable(msg) | AuthError::ConfigurationError(msg) => {
                Self::Internal(msg)
            }
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidInput(message) => Self::BadRequest(message),
            OrchestratorError::Unauthorized(auth) => auth.into(),
            OrchestratorError::ProcessingFailed { details } => Self::ProcessingFailed { details },
            OrchestratorError::QueueFull => Self::QueueFull,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_errors_map_to_status() {
        let cases = [
            (
                OrchestratorError::InvalidInput("videoKey is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrchestratorError::Unauthorized(AuthError::Forbidden {
                    user_id: "viewer".to_string(),
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                OrchestratorError::Unauthorized(AuthError::NotAuthenticated),
                StatusCode::UNAUTHORIZED,
            ),
            (
                OrchestratorError::ProcessingFailed {
                    details: "gone".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (OrchestratorError::QueueFull, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_error_body_shape() {
        let body = ApiError::ProcessingFailed {
            details: "source video not found: a.mp4".to_string(),
        }
        .body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Processing failed");
        assert_eq!(json["details"], "source video not found: a.mp4");

        let json = serde_json::to_value(ApiError::Forbidden.body()).unwrap();
        assert_eq!(json["error"], "Unauthorized");
        assert!(json.get("details").is_none());
    }
}
