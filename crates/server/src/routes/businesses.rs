use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use service::business::RegisterBusinessInput;
use service::domain::{Business, UserView};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    /// Business email, matched case-insensitively
    pub email: String,
}

#[utoipa::path(post, path = "/api/v1/businesses", tag = "businesses", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered", body = crate::openapi::BusinessDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterBusinessInput>,
) -> Result<(StatusCode, Json<Business>), ApiError> {
    let business = state.registration.register(input).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

#[utoipa::path(get, path = "/api/v1/businesses/{id}", tag = "businesses", params(("id" = Uuid, Path, description = "Business id")), responses((status = 200, description = "Business", body = crate::openapi::BusinessDoc), (status = 404, description = "Not Found")))]
pub async fn get_business(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Business>, ApiError> {
    Ok(Json(state.directory.get_business(id).await?))
}

#[utoipa::path(get, path = "/api/v1/businesses", tag = "businesses", params(EmailQuery), responses((status = 200, description = "Business", body = crate::openapi::BusinessDoc), (status = 401, description = "Unauthorized"), (status = 404, description = "Not Found")))]
pub async fn find_by_email(
    State(state): State<ServerState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<Business>, ApiError> {
    Ok(Json(state.directory.find_business_by_email(&q.email).await?))
}

#[utoipa::path(get, path = "/api/v1/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User", body = crate::openapi::UserDoc), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn get_user(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.directory.get_user(id).await?))
}
