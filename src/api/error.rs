// file: src/api/error.rs
// description: maps domain errors onto json http responses
// reference: https://docs.rs/axum/latest/axum/response/trait.IntoResponse.html

use crate::error::CmsError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub CmsError);

impl From<CmsError> for ApiError {
    fn from(err: CmsError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CmsError::Validation { .. } => StatusCode::BAD_REQUEST,
            CmsError::NotFound { .. } => StatusCode::NOT_FOUND,
            CmsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CmsError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.0 {
            CmsError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            CmsError::NotFound { .. } | CmsError::Unauthorized(_) => json!({
                "error": self.0.to_string(),
            }),
            CmsError::Upstream {
                status: upstream,
                message,
            } => json!({
                "error": "Failed to create contact in CRM",
                "details": message,
                "status": upstream,
            }),
            CmsError::Config(message) => {
                error!("Configuration problem while serving request: {}", message);
                json!({ "error": "Server configuration error" })
            }
            other => {
                error!("Request failed: {}", other);
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}
