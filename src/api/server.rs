// file: src/api/server.rs
// description: application state, router assembly and the http server loop
// reference: https://docs.rs/axum/latest/axum/fn.serve.html

use super::auth::require_admin;
use super::handlers;
use crate::config::{Config, ServerConfig};
use crate::error::{CmsError, Result};
use crate::pipeline::ContentPipeline;
use crate::relay::{LeadRelay, TrackingStore};
use crate::store::ImageUploader;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub struct AppState {
    pub config: Config,
    pub pipeline: ContentPipeline,
    pub uploader: ImageUploader,
    pub relay: LeadRelay,
    pub tracking: TrackingStore,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let admin_token = config
            .admin
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            pipeline: ContentPipeline::from_config(&config.blog),
            uploader: ImageUploader::from_config(&config.uploads),
            relay: LeadRelay::new(config.crm.clone())?,
            tracking: TrackingStore::from_config(&config.tracking),
            admin_token,
            config,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.uploader.max_bytes() + MULTIPART_OVERHEAD;

    let admin = Router::new()
        .route(
            "/blog",
            get(handlers::admin_list)
                .post(handlers::admin_upsert)
                .delete(handlers::admin_delete),
        )
        .route("/upload", post(handlers::admin_upload))
        .layer(DefaultBodyLimit::max(upload_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/blog-posts", get(handlers::list_posts))
        .route("/api/blog-posts/{slug}", get(handlers::get_post))
        .route("/api/blog-posts/{slug}/render", get(handlers::render_post))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/form", post(handlers::submit_form))
        .route("/api/tracking", post(handlers::capture_tracking))
        .route("/api/health", get(handlers::health))
        .nest("/api/admin", admin)
        .layer(cors_layer(&state.config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
    } else {
        CorsLayer::new()
    }
}

/// Serves until ctrl-c.
pub async fn run_api(state: AppState) -> Result<()> {
    let address = state.config.bind_address();
    if state.admin_token.is_none() {
        warn!("No admin token configured; admin routes are open");
    }
    if !state.relay.is_configured() {
        warn!("CRM credentials missing; lead submissions will fail");
    }

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| CmsError::Config(format!("Failed to bind {}: {}", address, e)))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, build_router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
