use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::rate_limiter::RateLimiter;
use crate::config::rate_limits::RateAction;
use crate::http::{AppError, AuthUser};
use crate::AppState;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Per-user hourly quotas on write endpoints. Unauthenticated requests pass
/// through and are rejected by the handler's own extractor.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let action = RateAction::for_request(request.method(), request.uri().path());

    let (Some(action), Some(auth_user)) = (action, auth) else {
        return Ok(next.run(request).await);
    };

    let rate_limiter = RateLimiter::new(state.cache.clone(), state.action_limits);
    let info = rate_limiter
        .hit(auth_user.user_id, action)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth_user.user_id, "failed to check rate limit");
            AppError::internal("failed to check rate limit").with_error(&err)
        })?;

    if info.limited {
        return Err(AppError::rate_limited(format!(
            "rate limit exceeded for action: {}, try again later",
            action.as_str()
        )));
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(info.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(info.remaining));

    Ok(response)
}
