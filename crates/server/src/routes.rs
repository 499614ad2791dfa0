use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;
use service::domain::ADMIN_ROLE;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod businesses;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public, authenticated and admin routes
pub fn build_router(state: auth::ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/v1/businesses", post(businesses::register))
        .route("/api/v1/businesses/:id", get(businesses::get_business))
        .route("/api/v1/login", post(auth::login))
        .route("/api/v1/logout", post(auth::logout));

    let admin = Router::new()
        .route("/api/v1/users/:id", get(businesses::get_user))
        .route_layer(middleware::from_fn_with_state(ADMIN_ROLE, auth::require_role));

    // authenticate wraps everything below, including the role check
    let protected = Router::new()
        .route("/api/v1/businesses", get(businesses::find_by_email))
        .route("/api/v1/me", get(auth::me))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::authenticate));

    public
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
