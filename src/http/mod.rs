use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod extract;
mod handlers;
mod middleware;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

/// Headroom for multipart boundaries and the `text` field on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.image_max_bytes + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .merge(routes::posts(body_limit))
        .merge(routes::friends())
        .merge(routes::notifications());

    Router::new()
        .merge(routes::health())
        .nest("/v1", api)
        .fallback(handlers::route_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ))
        .with_state(state)
}
