//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use looprule_domain::error::{LoopRuleError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`LoopRuleError`] to an HTTP response with appropriate status code.
pub struct ApiError(LoopRuleError);

impl ApiError {
    /// Rejection for a path segment that is not a valid id.
    #[must_use]
    pub fn invalid_id(raw: &str) -> Self {
        Self(ValidationError::InvalidId(raw.to_string()).into())
    }
}

impl From<LoopRuleError> for ApiError {
    fn from(err: LoopRuleError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LoopRuleError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            LoopRuleError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            LoopRuleError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
