pub mod auth;
pub mod vouchers;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::{openapi::ApiDoc, state::ServerState};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router: public routes plus the bearer-protected voucher API.
/// Requests running past `request_timeout` are answered with 408.
pub fn build_router(state: ServerState, cors: CorsLayer, request_timeout: Duration) -> Router {
    let upload_limit = usize::try_from(state.vouchers.config().csv_max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Public routes (health, login, docs)
    let public = Router::new()
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Protected voucher routes
    let api = Router::new()
        .route("/vouchers", get(vouchers::list).post(vouchers::create))
        .route("/vouchers/export", get(vouchers::export))
        .route(
            "/vouchers/upload-csv",
            post(vouchers::upload_csv).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/vouchers/:id",
            get(vouchers::get).put(vouchers::update).delete(vouchers::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    // Compose
    public
        .merge(api)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
