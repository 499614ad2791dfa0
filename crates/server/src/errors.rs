use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use service::errors::DirectoryError;

/// HTTP face of [`DirectoryError`].
#[derive(Debug)]
pub struct ApiError(pub DirectoryError);

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DirectoryError::Validation(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Conflict(_) => StatusCode::CONFLICT,
            DirectoryError::Unauthorized => StatusCode::UNAUTHORIZED,
            DirectoryError::Forbidden(_) => StatusCode::FORBIDDEN,
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::Persistence(_) | DirectoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        let body = match &self.0 {
            DirectoryError::Validation(errs) => json!({
                "error": { "code": code, "message": "validation failed", "fields": errs }
            }),
            DirectoryError::Persistence(_) | DirectoryError::Internal(_) => {
                // details stay in the log
                error!(code, error = %self.0, "request failed");
                json!({ "error": { "code": code, "message": "internal server error" } })
            }
            other => json!({ "error": { "code": code, "message": other.to_string() } }),
        };
        (status, Json(body)).into_response()
    }
}
