// file: src/api/auth.rs
// description: bearer token guard for the admin routes
// reference: https://docs.rs/axum/latest/axum/middleware/fn.from_fn_with_state.html

use super::error::ApiError;
use super::server::AppState;
use crate::error::CmsError;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Lets the request through when no admin token is configured, otherwise
/// requires `Authorization: Bearer <token>`.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if tokens_match(token, expected) => Ok(next.run(request).await),
        _ => Err(CmsError::Unauthorized("missing or invalid admin token".to_string()).into()),
    }
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
