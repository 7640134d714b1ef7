use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, optional_authenticate, require_admin, require_auth};
use crate::state::AppState;

/// Full application router. Route layers run bottom-up, so `authenticate`
/// is always added after the role check it feeds.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(school_read_routes(&state))
        .merge(school_write_routes(&state))
        .merge(media_routes(&state))
        .merge(auth_routes(&state))
        .fallback(not_found);

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn school_read_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/schools", get(public::school_list))
        .route("/api/schools/:id", get(public::school_get))
        .route_layer(from_fn_with_state(state.clone(), optional_authenticate))
}

fn school_write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/schools", post(protected::school_post))
        .route(
            "/api/schools/:id",
            put(protected::school_put).delete(protected::school_delete),
        )
        .route_layer(from_fn(require_auth))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

fn media_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new().route("/api/media", post(protected::media_post));

    if state.config.security.media_requires_auth {
        router
            .route_layer(from_fn(require_auth))
            .route_layer(from_fn_with_state(state.clone(), authenticate))
    } else {
        router
    }
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let me = Router::new()
        .route("/api/auth/me", get(protected::whoami_get))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let provisioning = Router::new()
        .route("/api/auth/create-employee", post(elevated::employee_create))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    me.merge(provisioning)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// `None` when CORS is disabled. An empty origin list or `*` allows any origin.
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    Some(layer.allow_origin(AllowOrigin::list(origins)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(enable_cors: bool, origins: &[&str]) -> SecurityConfig {
        SecurityConfig {
            enable_cors,
            cors_origins: origins.iter().map(|s| s.to_string()).collect(),
            media_requires_auth: false,
        }
    }

    #[test]
    fn cors_follows_configuration() {
        assert!(cors_layer(&security(false, &["*"])).is_none());
        assert!(cors_layer(&security(true, &[])).is_some());
        assert!(cors_layer(&security(true, &["https://schools.ge", "bad\norigin"])).is_some());
    }
}
