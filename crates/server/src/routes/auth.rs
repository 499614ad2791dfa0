use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;

use service::auth::{domain::LoginInput, AuthService, Passwords, TokenKeys};
use service::business::{RegistrationConfig, RegistrationService};
use service::directory::DirectoryService;
use service::domain::Principal;
use service::errors::DirectoryError;
use service::store::DirectoryStore;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub registration: Arc<RegistrationService>,
    pub auth: Arc<AuthService>,
    pub directory: Arc<DirectoryService>,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        passwords: Passwords,
        tokens: Arc<TokenKeys>,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            registration: Arc::new(RegistrationService::new(store.clone(), passwords.clone(), registration)),
            auth: Arc::new(AuthService::new(store.clone(), passwords, tokens)),
            directory: Arc::new(DirectoryService::new(store)),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[utoipa::path(post, path = "/api/v1/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 201, description = "Token issued", body = crate::openapi::LoginResponse), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(StatusCode, CookieJar, Json<LoginOutput>), ApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let out = LoginOutput { token: session.token, expires_at: session.expires_at };
    Ok((StatusCode::CREATED, jar, Json(out)))
}

#[utoipa::path(post, path = "/api/v1/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/v1/me", tag = "auth", responses((status = 200, description = "Current principal", body = crate::openapi::PrincipalDoc), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// `Authorization: Bearer <token>`, else the auth cookie. A present but
/// non-bearer Authorization header yields nothing.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Verify the request's token and attach the resulting [`Principal`] to the
/// request extensions. Any failure is a 401 and the handler never runs.
pub async fn authenticate(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(req.headers()) else {
        tracing::warn!(path = %path, "missing bearer token and auth cookie");
        return Err(DirectoryError::Unauthorized.into());
    };
    let principal = state.auth.authenticate(&token).map_err(|e| {
        tracing::warn!(path = %path, "token validation failed");
        ApiError(e)
    })?;
    tracing::debug!(user_id = %principal.id, "authenticated");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Layer state is the role the route requires. Must sit inside
/// [`authenticate`]; a request with no principal is forbidden.
pub async fn require_role(
    State(role): State<&'static str>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match req.extensions().get::<Principal>() {
        Some(p) if p.has_role(role) => Ok(next.run(req).await),
        Some(p) => {
            tracing::warn!(user_id = %p.id, role, "missing required role");
            Err(DirectoryError::Forbidden(format!("requires role {}", role)).into())
        }
        None => Err(DirectoryError::Forbidden(format!("requires role {}", role)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        h.insert(header::COOKIE, HeaderValue::from_static("auth_token=from-cookie"));
        assert_eq!(extract_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_the_fallback() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=tok"));
        assert_eq!(extract_token(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_ignored() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        h.insert(header::COOKIE, HeaderValue::from_static("auth_token=tok"));
        assert_eq!(extract_token(&h), None);

        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&h), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
