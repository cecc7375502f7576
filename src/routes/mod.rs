//! Router assembly: `/health`-style common routes at the root, the catalog API under `/api`.

mod catalog;
mod common;
mod user;

pub use common::common_routes;

use crate::auth::{require_admin, require_user};
use crate::config::AppConfig;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::MethodRouter,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Largest accepted request body; multipart uploads carry several images.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Requires a valid session token.
pub(crate) fn authenticated(
    state: &AppState,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), require_user))
}

/// Requires a valid session token of an admin user.
pub(crate) fn admin_only(
    state: &AppState,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    authenticated(state, route.route_layer(middleware::from_fn(require_admin)))
}

/// `/api` routes. Anything unmatched is looked up in the uploads folder.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(user::routes(state))
        .merge(catalog::category_routes(state))
        .merge(catalog::product_routes(state))
        .merge(catalog::package_routes(state))
        .merge(catalog::order_routes(state))
        .fallback_service(ServeDir::new(state.images.root()))
}

/// The complete application.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes())
        .nest("/api", api_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Credentialed CORS for the configured frontend; permissive when none is set.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let Some(origin) = config.frontend_url.as_deref() else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!(origin, "FRONTEND_URL is not a valid origin, CORS left open");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
    }
}
