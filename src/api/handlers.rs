// file: src/api/handlers.rs
// description: http handlers for blog reads, admin authoring, uploads and leads
// reference: https://docs.rs/axum/latest/axum/extract/index.html

use super::error::ApiResult;
use super::server::AppState;
use crate::error::CmsError;
use crate::models::{LeadSubmission, PostInput};
use crate::relay::LandingVisit;
use crate::utils::{HealthCheck, HealthReport, HealthStatus};
use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying the visitor's attribution session token.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlugQuery {
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub query: std::collections::HashMap<String, String>,
    pub referrer: Option<String>,
    pub context: Option<String>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryQuery>,
) -> ApiResult<Json<Value>> {
    let store = state.pipeline.store();
    let posts = match params.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => store.list_by_category(category).await?,
        None => store.list().await?,
    };
    Ok(Json(json!({ "data": posts })))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let post = state.pipeline.store().get_by_slug(&slug).await?;
    Ok(Json(json!({ "data": post })))
}

pub async fn render_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let rendered = state.pipeline.render_post(&slug).await?;
    Ok(Json(json!({ "data": rendered })))
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let categories = state.pipeline.store().categories().await?;
    Ok(Json(json!({ "data": categories })))
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlugQuery>,
) -> ApiResult<Json<Value>> {
    let store = state.pipeline.store();
    match params.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => {
            let post = store.get_by_slug(slug).await?;
            Ok(Json(json!({ "data": post })))
        }
        None => {
            let posts = store.list().await?;
            Ok(Json(json!({ "data": posts })))
        }
    }
}

pub async fn admin_upsert(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PostInput>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.pipeline.store().upsert(input).await?;
    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "Blog post created successfully")
    } else {
        (StatusCode::OK, "Blog post updated successfully")
    };

    Ok((
        status,
        Json(json!({
            "success": true,
            "message": message,
            "blog": outcome.post,
            "created": outcome.created,
        })),
    ))
}

pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlugQuery>,
) -> ApiResult<Json<Value>> {
    let slug = params
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CmsError::missing_field("slug"))?;

    state.pipeline.store().delete(slug).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Blog post deleted successfully",
    })))
}

pub async fn admin_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CmsError::invalid("file", e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CmsError::invalid("file", e.body_text()))?;

        let image = state.uploader.save(&file_name, &content_type, &bytes).await?;
        return Ok(Json(json!({
            "success": true,
            "url": image.url,
            "filename": image.filename,
        })));
    }

    Err(CmsError::invalid("file", "No file provided").into())
}

pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(lead): Json<LeadSubmission>,
) -> ApiResult<Json<Value>> {
    let tracking = match session_id(&headers) {
        Some(session) => state.tracking.get(session).await,
        None => None,
    };

    let result = state.relay.submit(&lead, tracking.as_ref()).await?;
    Ok(Json(json!({
        "success": true,
        "contactId": result.contact_id,
        "message": "Contact created successfully in CRM",
        "data": result.data,
    })))
}

pub async fn capture_tracking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackingRequest>,
) -> ApiResult<Json<Value>> {
    let session = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let visit = LandingVisit {
        query: request.query,
        referrer: request.referrer,
    };
    let mut tracking = state.tracking.capture_once(&session, &visit).await;
    if let Some(context) = request.context.as_deref()
        && let Some(updated) = state.tracking.update_context(&session, context).await
    {
        tracking = updated;
    }

    Ok(Json(json!({
        "sessionId": session,
        "source": tracking.source,
        "context": tracking.context,
    })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let checks = vec![
        HealthCheck::content_dir(&state.config.blog),
        HealthCheck::crm(&state.config.crm),
    ];
    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());

    let status = if report.overall_status == HealthStatus::Unhealthy {
        warn!("Health check unhealthy");
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    debug!("Health check: {:?}", report.overall_status);

    (status, Json(report))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
