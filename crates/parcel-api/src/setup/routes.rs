//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use parcel_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        max_request_body_bytes = config.max_request_body_bytes(),
        "HTTP limits enabled"
    );

    let app = upload_routes()
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        // RequestBodyLimitLayer below is the only body limit
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::upload::index))
        .route("/upload", post(handlers::upload::upload_single))
        .route("/upload-multiple", post(handlers::upload::upload_multiple))
        .route(
            "/upload-multiple-with-specified-fields",
            post(handlers::upload::upload_multiple_with_specified_fields),
        )
        .route(
            "/upload-multiple-with-fields",
            post(handlers::upload::upload_multiple_with_fields),
        )
}
