use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{catch_panic_layer, json_error_middleware},
    state::AppState,
};

use super::user;

pub const USER_PREFIX: &str = "/user";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().nest(USER_PREFIX, user::router(state))
}

/// The full HTTP stack: routes plus error envelope, panic catcher and
/// request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    router(state)
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http())
}
