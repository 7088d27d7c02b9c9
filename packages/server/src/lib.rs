pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task Collector API",
        version = "1.0.0",
        description = "Receives metadata of generated task packages"
    ),
    paths(
        handlers::health::health,
        handlers::task::create_task,
        handlers::task::get_task,
        handlers::task::list_tasks,
    ),
    components(schemas(
        common::TaskSubmission,
        common::TaskRecord,
        common::RubricEntry,
        common::FileMetadata,
        models::health::HealthResponse,
        error::ErrorBody,
    )),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Tasks", description = "Generated task packages"),
    ),
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if cors.allow_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(cors.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors);

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", routes::api_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(cors)
}
