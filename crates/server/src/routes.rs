use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::CatalogService;

use crate::middleware::{correlation_id, handle_panic, track_metrics};
use crate::observability;
use crate::openapi::ApiDoc;

pub mod services;

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog: Arc::new(catalog) }
    }
}

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> impl IntoResponse {
    observability::encode_metrics()
}

/// Build the full application router: catalog API, health, metrics and docs.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/api/services", get(services::search).post(services::create))
        .route(
            "/api/services/:id",
            get(services::get_by_id).put(services::update).delete(services::delete),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(track_metrics))
        // Panics become the standard 500 envelope before tracing sees the response.
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(cors)
        // Outermost, so the trace span and every handler log carry the correlation id.
        .layer(middleware::from_fn(correlation_id))
}
