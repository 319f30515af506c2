//! Blog post endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;

use super::{success, ApiResponse, ApiResult, DeleteQuery};
use crate::errors::AppError;
use crate::events::Notification;
use crate::models::{BlogPost, CreateBlogPostRequest, UpdateBlogPostRequest};
use crate::render::render_admin_blog_posts;
use crate::repository::DeleteOutcome;
use crate::AppState;

async fn fragment(state: &AppState) -> String {
    render_admin_blog_posts(&state.content.blog_posts.list().await)
}

/// GET /api/admin/blog - List all blog posts, newest first.
pub async fn list_blog_posts(State(state): State<AppState>) -> ApiResult<Vec<BlogPost>> {
    success(state.content.blog_posts.list().await)
}

/// GET /api/admin/blog/{id} - Get a single blog post.
pub async fn get_blog_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<BlogPost> {
    match state.content.blog_posts.get(id).await {
        Some(post) => success(post),
        None => Err(AppError::NotFound(format!("Blog post {} not found", id))),
    }
}

/// POST /api/admin/blog - Create a blog post.
pub async fn create_blog_post(
    State(state): State<AppState>,
    Json(request): Json<CreateBlogPostRequest>,
) -> ApiResult<BlogPost> {
    let post = state.content.blog_posts.create(request).await?;
    state.events.track_event(
        "user_interaction",
        json!({"action": "blog_post_created", "id": post.id}),
    );

    Ok(ApiResponse::new(post)
        .with_fragment(fragment(&state).await)
        .with_notification(Notification::success("Blog yazısı başarıyla eklendi!")))
}

/// PUT /api/admin/blog/{id} - Update a blog post.
pub async fn update_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBlogPostRequest>,
) -> ApiResult<BlogPost> {
    let post = state.content.blog_posts.update(id, request).await?;

    Ok(ApiResponse::new(post)
        .with_fragment(fragment(&state).await)
        .with_notification(Notification::success("Blog yazısı başarıyla güncellendi!")))
}

/// DELETE /api/admin/blog/{id}?confirm=true - Delete a blog post.
pub async fn delete_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<DeleteOutcome> {
    match state.content.blog_posts.delete(id, query.confirmation()).await? {
        DeleteOutcome::Deleted => Ok(ApiResponse::new(DeleteOutcome::Deleted)
            .with_fragment(fragment(&state).await)
            .with_notification(Notification::info("Blog yazısı silindi!"))),
        DeleteOutcome::Cancelled => success(DeleteOutcome::Cancelled),
    }
}
