pub mod config;
pub mod dto;
pub mod handlers;
pub mod mailer;
pub mod service;
pub mod upload;
pub mod validation;

#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use service::RelayService;

/// Builds the relay router. `max_upload_bytes` bounds the multipart body of
/// `POST /career`.
pub fn router(service: Arc<RelayService>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health_check))
        .route("/contact", post(handlers::submit_contact))
        .route(
            "/career",
            post(handlers::submit_career).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-doc/openapi.json", handlers::ApiDoc::openapi()),
        )
        .with_state(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
