use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;
pub use crate::policy::{AuthUser, Caller};

/// Requires a valid bearer token; attaches [`AuthUser`] and [`Caller`].
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)?;
    let user = resolve_user(&state, token).await?;
    attach(&mut request, user);
    Ok(next.run(request).await)
}

/// Like [`authenticate`], but a request without `Authorization` proceeds as anonymous.
/// A header that is present and invalid is still rejected.
pub async fn optional_authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if headers.contains_key(AUTHORIZATION) {
        let token = extract_bearer(&headers)?;
        let user = resolve_user(&state, token).await?;
        attach(&mut request, user);
    } else {
        request.extensions_mut().insert(Caller::Anonymous);
    }
    Ok(next.run(request).await)
}

/// Any stored role. Must run after [`authenticate`].
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = attached_user(&request)?;
    if user.role.is_none() {
        tracing::warn!("User {} has no role; denying", user.id);
        return Err(ApiError::forbidden("A staff role is required"));
    }
    Ok(next.run(request).await)
}

/// Admin role only. Must run after [`authenticate`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = attached_user(&request)?;
    if !user.is_admin() {
        tracing::warn!("User {} is not an admin; denying", user.id);
        return Err(ApiError::forbidden("Admin role required"));
    }
    Ok(next.run(request).await)
}

fn attached_user(request: &Request) -> Result<&AuthUser, ApiError> {
    request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

fn attach(request: &mut Request, user: AuthUser) {
    request.extensions_mut().insert(Caller::User(user.clone()));
    request.extensions_mut().insert(user);
}

async fn resolve_user(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let identity = state.identity.verify(token).await.map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let role = state.roles.role_of(&identity.id).await.map_err(|e| {
        tracing::error!("Role lookup failed for {}: {}", identity.id, e);
        ApiError::internal_server_error("Failed to resolve user role")
    })?;

    tracing::debug!("Authenticated {} with role {:?}", identity.id, role);
    Ok(AuthUser {
        id: identity.id,
        email: identity.email,
        role,
    })
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    // The scheme name is case-insensitive.
    let (scheme, token) = auth_str.trim_start().split_once(' ').unwrap_or((auth_str.trim(), ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        ));
    }
    match token.trim() {
        "" => Err(ApiError::unauthorized("Empty bearer token")),
        token => Ok(token),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or(Caller::Anonymous))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
