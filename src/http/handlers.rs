use axum::{
    extract::{multipart::MultipartError, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::engagement::EngagementService;
use crate::app::feed::FeedService;
use crate::app::friends::FriendService;
use crate::app::media::{validate_image, ImageService};
use crate::app::notifications::NotificationService;
use crate::app::posts::PostService;
use crate::domain::engagement::{Comment, CommentOutcome, LikeOutcome, UnlikeOutcome};
use crate::domain::friendship::{FriendRequest, FriendRequestStatus, SendRequestOutcome};
use crate::domain::notification::Notification;
use crate::domain::page::{Page, PageRequest};
use crate::domain::post::{OwnedPostChange, Post, PostStats};
use crate::domain::user::Friend;
use crate::http::extract::{ApiJson, ApiMultipart, ApiPath, ApiQuery};
use crate::http::{AppError, AuthUser};
use crate::AppState;

const MAX_POST_TEXT_LEN: usize = 2200;
const MAX_COMMENT_LEN: usize = 1000;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.request.page(),
            limit: page.request.limit(),
            total: page.total,
            total_pages: page.total_pages(),
            has_more: page.has_more(),
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub message: &'static str,
    pub post: Post,
}

#[derive(Serialize)]
pub struct PostListResponse {
    pub message: &'static str,
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

impl PostListResponse {
    fn new(message: &'static str, page: Page<Post>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            message,
            posts: page.items,
            pagination,
        }
    }
}

fn page_request(query: PageQuery) -> Result<PageRequest, AppError> {
    PageRequest::new(query.page, query.limit).map_err(|err| AppError::bad_request(err.to_string()))
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    message: &'static str,
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse {
        message: "service status",
        status,
    })
}

pub(crate) async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("request body too large")
    } else {
        AppError::bad_request("invalid multipart body").with_error(&err)
    }
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let mut text: Option<String> = None;
    let mut image: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") => text = Some(field.text().await.map_err(multipart_error)?),
            Some("image") => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    image = Some(bytes);
                }
            }
            _ => {}
        }
    }

    let text = text.map(|text| text.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::bad_request("text is required"));
    }
    if text.chars().count() > MAX_POST_TEXT_LEN {
        return Err(AppError::bad_request(format!(
            "text must be at most {} characters",
            MAX_POST_TEXT_LEN
        )));
    }

    let image_url = match image {
        Some(bytes) => {
            let image = validate_image(bytes, state.image_max_bytes)
                .map_err(|rejection| AppError::bad_request(rejection.to_string()))?;
            let size = image.len();
            let service = ImageService::new(state.storage.clone());
            let url = service
                .upload_post_image(auth.user_id, image)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, author_id = %auth.user_id, bytes = size, "failed to upload post image");
                    AppError::internal("failed to upload image").with_error(&err)
                })?;
            Some(url)
        }
        None => None,
    };

    let service = PostService::new(state.db.clone());
    let post = service
        .create_post(auth.user_id, text, image_url)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = %auth.user_id, "failed to create post");
            AppError::internal("failed to create post").with_error(&err)
        })?;

    tracing::info!(post_id = %post.id, author_id = %auth.user_id, "post created");

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "post created",
            post,
        }),
    ))
}

pub async fn get_post(
    _auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to fetch post");
        AppError::internal("failed to fetch post").with_error(&err)
    })?;

    match post {
        Some(post) => Ok(Json(PostResponse {
            message: "post fetched",
            post,
        })),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn my_posts(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = page_request(query)?;

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_by_author(auth.user_id, page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list posts");
            AppError::internal("failed to list posts").with_error(&err)
        })?;

    Ok(Json(PostListResponse::new("posts fetched", posts)))
}

pub async fn delete_post(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    let change = service.soft_delete(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, user_id = %auth.user_id, "failed to delete post");
        AppError::internal("failed to delete post").with_error(&err)
    })?;

    match change {
        OwnedPostChange::Changed(post) => Ok(Json(PostResponse {
            message: "post deleted",
            post,
        })),
        OwnedPostChange::NotOwner => {
            Err(AppError::forbidden("you can only delete your own posts"))
        }
        OwnedPostChange::NotFound | OwnedPostChange::NotDeleted => {
            Err(AppError::not_found("post not found"))
        }
    }
}

pub async fn restore_post(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    let change = service.restore(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, user_id = %auth.user_id, "failed to restore post");
        AppError::internal("failed to restore post").with_error(&err)
    })?;

    match change {
        OwnedPostChange::Changed(post) => Ok(Json(PostResponse {
            message: "post restored",
            post,
        })),
        OwnedPostChange::NotOwner => {
            Err(AppError::forbidden("you can only restore your own posts"))
        }
        OwnedPostChange::NotDeleted => Err(AppError::bad_request("post is not deleted")),
        OwnedPostChange::NotFound => Err(AppError::not_found("post not found")),
    }
}

pub async fn deleted_posts(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = page_request(query)?;

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_deleted_by_author(auth.user_id, page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list deleted posts");
            AppError::internal("failed to list deleted posts").with_error(&err)
        })?;

    Ok(Json(PostListResponse::new("deleted posts fetched", posts)))
}

pub async fn liked_by_me(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = page_request(query)?;

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_liked_by(auth.user_id, page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list liked posts");
            AppError::internal("failed to list liked posts").with_error(&err)
        })?;

    Ok(Json(PostListResponse::new("liked posts fetched", posts)))
}

pub async fn my_liked_posts(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = page_request(query)?;

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_liked_of_author(auth.user_id, page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list my liked posts");
            AppError::internal("failed to list my liked posts").with_error(&err)
        })?;

    Ok(Json(PostListResponse::new("posts with likes fetched", posts)))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub message: &'static str,
    pub stats: PostStats,
}

pub async fn stats_overview(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    let stats = service.stats(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to aggregate post stats");
        AppError::internal("failed to aggregate post stats").with_error(&err)
    })?;

    Ok(Json(StatsResponse {
        message: "stats fetched",
        stats,
    }))
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub message: &'static str,
    pub post_id: Uuid,
    pub likes_count: i64,
}

pub async fn like_post(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let outcome = service.like_post(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, post_id = %id, "failed to like post");
        AppError::internal("failed to like post").with_error(&err)
    })?;

    match outcome {
        LikeOutcome::Liked { likes_count } => Ok(Json(LikeResponse {
            message: "post liked",
            post_id: id,
            likes_count,
        })),
        LikeOutcome::AlreadyLiked => Err(AppError::bad_request("you already liked this post")),
        LikeOutcome::PostNotFound => Err(AppError::not_found("post not found")),
    }
}

pub async fn unlike_post(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let outcome = service.unlike_post(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, post_id = %id, "failed to unlike post");
        AppError::internal("failed to unlike post").with_error(&err)
    })?;

    match outcome {
        UnlikeOutcome::Unliked { likes_count } => Ok(Json(LikeResponse {
            message: "post unliked",
            post_id: id,
            likes_count,
        })),
        UnlikeOutcome::NotLiked => Err(AppError::bad_request("you have not liked this post")),
        UnlikeOutcome::PostNotFound => Err(AppError::not_found("post not found")),
    }
}

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub message: &'static str,
    pub comment: Comment,
    pub comments_count: i64,
}

pub async fn comment_post(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::bad_request("comment text is required"));
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(format!(
            "comment must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let service = EngagementService::new(state.db.clone());
    let outcome = service
        .comment_post(auth.user_id, id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, post_id = %id, "failed to comment");
            AppError::internal("failed to add comment").with_error(&err)
        })?;

    match outcome {
        CommentOutcome::Added {
            comment,
            comments_count,
        } => Ok((
            StatusCode::CREATED,
            Json(CommentResponse {
                message: "comment added",
                comment,
                comments_count,
            }),
        )),
        CommentOutcome::PostNotFound => Err(AppError::not_found("post not found")),
    }
}

#[derive(Serialize)]
pub struct NetworkSummary {
    pub direct_friends: usize,
    pub second_degree: usize,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub message: &'static str,
    pub posts: Vec<Post>,
    pub pagination: Pagination,
    pub network: NetworkSummary,
}

pub async fn feed(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let page = page_request(query)?;

    let service = FeedService::new(state.db.clone());
    let (posts, network) = service
        .get_feed(auth.user_id, page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to assemble feed");
            AppError::internal("failed to fetch feed").with_error(&err)
        })?;

    let pagination = Pagination::from(&posts);
    Ok(Json(FeedResponse {
        message: "feed fetched",
        posts: posts.items,
        pagination,
        network: NetworkSummary {
            direct_friends: network.direct().len(),
            second_degree: network.second_degree().len(),
        },
    }))
}

#[derive(Serialize)]
pub struct FriendRequestResponse {
    pub message: &'static str,
    pub request: FriendRequest,
}

#[derive(Serialize)]
pub struct FriendRequestListResponse {
    pub message: &'static str,
    pub requests: Vec<FriendRequest>,
}

#[derive(Serialize)]
pub struct FriendListResponse {
    pub message: &'static str,
    pub friends: Vec<Friend>,
}

pub async fn send_friend_request(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FriendRequestResponse>), AppError> {
    if id == auth.user_id {
        return Err(AppError::bad_request(
            "cannot send a friend request to yourself",
        ));
    }

    let service = FriendService::new(state.db.clone());
    let outcome = service.send_request(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, from_user_id = %auth.user_id, to_user_id = %id, "failed to send friend request");
        AppError::internal("failed to send friend request").with_error(&err)
    })?;

    match outcome {
        SendRequestOutcome::Sent(request) => Ok((
            StatusCode::CREATED,
            Json(FriendRequestResponse {
                message: "friend request sent",
                request,
            }),
        )),
        SendRequestOutcome::UserNotFound => Err(AppError::not_found("user not found")),
        SendRequestOutcome::AlreadyExists => {
            Err(AppError::conflict("friend request already exists"))
        }
    }
}

async fn respond_to_friend_request(
    request_id: Uuid,
    auth: AuthUser,
    state: AppState,
    status: FriendRequestStatus,
) -> Result<Json<FriendRequestResponse>, AppError> {
    let service = FriendService::new(state.db.clone());
    let request = service
        .respond(request_id, auth.user_id, status)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, request_id = %request_id, user_id = %auth.user_id, status = status.as_db(), "failed to answer friend request");
            AppError::internal("failed to answer friend request").with_error(&err)
        })?;

    let message = match status {
        FriendRequestStatus::Accepted => "friend request accepted",
        _ => "friend request rejected",
    };

    match request {
        Some(request) => Ok(Json(FriendRequestResponse { message, request })),
        None => Err(AppError::not_found("friend request not found")),
    }
}

pub async fn accept_friend_request(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<FriendRequestResponse>, AppError> {
    respond_to_friend_request(id, auth, state, FriendRequestStatus::Accepted).await
}

pub async fn reject_friend_request(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<FriendRequestResponse>, AppError> {
    respond_to_friend_request(id, auth, state, FriendRequestStatus::Rejected).await
}

pub async fn list_friend_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FriendRequestListResponse>, AppError> {
    let service = FriendService::new(state.db.clone());
    let requests = service
        .list_incoming_pending(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list friend requests");
            AppError::internal("failed to list friend requests").with_error(&err)
        })?;

    Ok(Json(FriendRequestListResponse {
        message: "friend requests fetched",
        requests,
    }))
}

pub async fn list_friends(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FriendListResponse>, AppError> {
    let service = FriendService::new(state.db.clone());
    let friends = service.list_friends(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list friends");
        AppError::internal("failed to list friends").with_error(&err)
    })?;

    Ok(Json(FriendListResponse {
        message: "friends fetched",
        friends,
    }))
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub message: &'static str,
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let page = page_request(query)?;

    let service = NotificationService::new(state.db.clone());
    let notifications = service.list(auth.user_id, page).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list notifications");
        AppError::internal("failed to list notifications").with_error(&err)
    })?;

    let pagination = Pagination::from(&notifications);
    Ok(Json(NotificationListResponse {
        message: "notifications fetched",
        notifications: notifications.items,
        pagination,
    }))
}

pub async fn mark_notification_read(
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = NotificationService::new(state.db.clone());
    let updated = service.mark_read(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, notification_id = %id, user_id = %auth.user_id, "failed to mark notification read");
        AppError::internal("failed to mark notification read").with_error(&err)
    })?;

    if updated {
        Ok(Json(MessageResponse {
            message: "notification marked as read",
        }))
    } else {
        Err(AppError::not_found("notification not found"))
    }
}
