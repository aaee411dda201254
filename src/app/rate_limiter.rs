use anyhow::Result;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::config::rate_limits::{current_window, ActionLimits, RateAction, RATE_WINDOW_SECONDS};
use crate::infra::cache::RedisCache;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub limited: bool,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: RedisCache,
    limits: ActionLimits,
}

impl RateLimiter {
    pub fn new(cache: RedisCache, limits: ActionLimits) -> Self {
        Self { cache, limits }
    }

    /// Count one attempt of `action` in the current hourly window.
    pub async fn hit(&self, user_id: Uuid, action: RateAction) -> Result<RateLimitInfo> {
        let limit = self.limits.limit_for(action);
        let key = window_key(user_id, action);

        let mut conn = self.cache.connection().await?;
        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&key, RATE_WINDOW_SECONDS as i64).await?;
        }

        if count > limit {
            tracing::debug!(
                user_id = %user_id,
                action = action.as_str(),
                count = count,
                limit = limit,
                "rate limit exceeded"
            );
            return Ok(RateLimitInfo {
                limited: true,
                limit,
                remaining: 0,
            });
        }

        Ok(RateLimitInfo {
            limited: false,
            limit,
            remaining: limit - count,
        })
    }
}

pub fn window_key(user_id: Uuid, action: RateAction) -> String {
    format!(
        "ratelimit:{}:{}:{}",
        user_id,
        action.as_str(),
        current_window(RATE_WINDOW_SECONDS)
    )
}
