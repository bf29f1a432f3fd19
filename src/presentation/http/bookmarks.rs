use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::ports::bookmark_repository::StoreError;
use crate::application::services::sync::{self, AddError, BookmarkFeed};
use crate::bootstrap::app_context::AppContext;
use crate::domain::bookmarks::bookmark::Bookmark;
use crate::presentation::http::auth::{self, SessionToken};

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route("/bookmarks/:id", delete(delete_bookmark))
        .with_state(ctx)
}

// owner_id is deliberately absent: callers only ever see their own rows.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkItem {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Bookmark> for BookmarkItem {
    fn from(b: Bookmark) -> Self {
        Self {
            id: b.id,
            url: b.url,
            title: b.title,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkListResponse {
    pub items: Vec<BookmarkItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookmarkRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
}

fn store_error_response(err: StoreError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        StoreError::SchemaMissing => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::AccessDenied => StatusCode::FORBIDDEN,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiError {
        error: sync::remediation(&err),
    }))
}

fn user_feed(ctx: &AppContext, owner_id: String) -> BookmarkFeed {
    BookmarkFeed::new(ctx.bookmark_repo(), ctx.change_publisher(), owner_id)
}

#[utoipa::path(get, path = "/api/bookmarks", tag = "Bookmarks", responses(
    (status = 200, body = BookmarkListResponse),
    (status = 401)
))]
pub async fn list_bookmarks(
    State(ctx): State<AppContext>,
    token: SessionToken,
) -> Result<Json<BookmarkListResponse>, (StatusCode, Json<ApiError>)> {
    let user = auth::require_user(&ctx, &token)
        .await
        .map_err(unauthorized)?;
    let items = ctx
        .bookmark_repo()
        .list_for_owner(&user.id)
        .await
        .map_err(store_error_response)?;
    Ok(Json(BookmarkListResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(post, path = "/api/bookmarks", tag = "Bookmarks", request_body = CreateBookmarkRequest, responses(
    (status = 201, body = BookmarkItem),
    (status = 401),
    (status = 422, body = ApiError)
))]
pub async fn create_bookmark(
    State(ctx): State<AppContext>,
    token: SessionToken,
    Json(req): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkItem>), (StatusCode, Json<ApiError>)> {
    let user = auth::require_user(&ctx, &token)
        .await
        .map_err(unauthorized)?;
    let mut feed = user_feed(&ctx, user.id);
    match feed.add(&req.url, &req.title).await {
        Ok(row) => Ok((StatusCode::CREATED, Json(row.into()))),
        Err(AddError::EmptyUrl) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError {
                error: "URL is required".to_string(),
            }),
        )),
        Err(AddError::Store(err)) => Err(store_error_response(err)),
    }
}

#[utoipa::path(delete, path = "/api/bookmarks/{id}", tag = "Bookmarks", params(
    ("id" = Uuid, Path, description = "Bookmark ID")
), responses(
    (status = 204),
    (status = 401),
    (status = 404)
))]
pub async fn delete_bookmark(
    State(ctx): State<AppContext>,
    token: SessionToken,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let user = auth::require_user(&ctx, &token)
        .await
        .map_err(unauthorized)?;
    let mut feed = user_feed(&ctx, user.id);
    match feed.remove(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "bookmark not found".to_string(),
            }),
        )),
        Err(err) => Err(store_error_response(err)),
    }
}

fn unauthorized(status: StatusCode) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError {
        error: "sign in to manage bookmarks".to_string(),
    }))
}
