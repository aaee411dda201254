use axum::http::Method;
use time::OffsetDateTime;

/// Write actions that count against a user's hourly quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateAction {
    Post,
    Like,
    Comment,
    FriendRequest,
}

impl RateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::FriendRequest => "friend_request",
        }
    }

    /// Classify a request. `path` is the full request path, `/v1` prefix included.
    pub fn for_request(method: &Method, path: &str) -> Option<Self> {
        if method != Method::POST {
            return None;
        }
        let path = path.strip_prefix("/v1").unwrap_or(path);

        if path == "/posts/create" {
            Some(Self::Post)
        } else if path.starts_with("/posts/like/") {
            Some(Self::Like)
        } else if path.starts_with("/posts/comment/") {
            Some(Self::Comment)
        } else if path.starts_with("/friends/requests/")
            && !path.ends_with("/accept")
            && !path.ends_with("/reject")
        {
            Some(Self::FriendRequest)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionLimits {
    pub posts_per_hour: u32,
    pub likes_per_hour: u32,
    pub comments_per_hour: u32,
    pub friend_requests_per_hour: u32,
}

impl ActionLimits {
    pub fn limit_for(&self, action: RateAction) -> u32 {
        match action {
            RateAction::Post => self.posts_per_hour,
            RateAction::Like => self.likes_per_hour,
            RateAction::Comment => self.comments_per_hour,
            RateAction::FriendRequest => self.friend_requests_per_hour,
        }
    }
}

pub const RATE_WINDOW_SECONDS: u64 = 3600;

/// Index of the fixed window containing `now`.
pub fn current_window(window_seconds: u64) -> u64 {
    let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
    now / window_seconds
}
