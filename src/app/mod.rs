pub mod auth;
pub mod engagement;
pub mod feed;
pub mod friends;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod rate_limiter;
