use axum::extract::DefaultBodyLimit;
use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

/// `body_limit` bounds the whole request, multipart framing included. Extractors
/// that hit it reject with 413 through `AppError`.
pub fn posts(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/posts/create", post(handlers::create_post))
        .route("/posts/like/:id", post(handlers::like_post))
        .route("/posts/unlike/:id", post(handlers::unlike_post))
        .route("/posts/myposts", get(handlers::my_posts))
        .route("/posts/delete/:id", delete(handlers::delete_post))
        .route("/posts/restore/:id", put(handlers::restore_post))
        .route("/posts/deletedposts", get(handlers::deleted_posts))
        .route("/posts/comment/:id", post(handlers::comment_post))
        .route("/posts/feed", get(handlers::feed))
        .route("/posts/liked-by-me", get(handlers::liked_by_me))
        .route("/posts/my-liked-posts", get(handlers::my_liked_posts))
        .route("/posts/stats/overview", get(handlers::stats_overview))
        .route("/posts/:id", get(handlers::get_post))
        .layer(DefaultBodyLimit::max(body_limit))
}

pub fn friends() -> Router<AppState> {
    Router::new()
        .route("/friends", get(handlers::list_friends))
        .route("/friends/requests", get(handlers::list_friend_requests))
        .route("/friends/requests/:id", post(handlers::send_friend_request))
        .route(
            "/friends/requests/:id/accept",
            post(handlers::accept_friend_request),
        )
        .route(
            "/friends/requests/:id/reject",
            post(handlers::reject_friend_request),
        )
}

pub fn notifications() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
}
