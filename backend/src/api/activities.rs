//! Activity endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;

use super::{success, ApiResponse, ApiResult, DeleteQuery};
use crate::errors::AppError;
use crate::events::Notification;
use crate::models::{Activity, CreateActivityRequest, UpdateActivityRequest};
use crate::render::render_admin_activities;
use crate::repository::DeleteOutcome;
use crate::AppState;

async fn fragment(state: &AppState) -> String {
    render_admin_activities(&state.content.activities.list().await)
}

/// GET /api/admin/activities - List all activities, newest first.
pub async fn list_activities(State(state): State<AppState>) -> ApiResult<Vec<Activity>> {
    success(state.content.activities.list().await)
}

/// GET /api/admin/activities/{id} - Get a single activity.
pub async fn get_activity(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Activity> {
    match state.content.activities.get(id).await {
        Some(activity) => success(activity),
        None => Err(AppError::NotFound(format!("Activity {} not found", id))),
    }
}

/// POST /api/admin/activities - Create an activity.
pub async fn create_activity(
    State(state): State<AppState>,
    Json(request): Json<CreateActivityRequest>,
) -> ApiResult<Activity> {
    let activity = state.content.activities.create(request).await?;
    state.events.track_event(
        "user_interaction",
        json!({"action": "activity_created", "id": activity.id}),
    );

    Ok(ApiResponse::new(activity)
        .with_fragment(fragment(&state).await)
        .with_notification(Notification::success("Etkinlik başarıyla eklendi!")))
}

/// PUT /api/admin/activities/{id} - Update an activity.
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateActivityRequest>,
) -> ApiResult<Activity> {
    let activity = state.content.activities.update(id, request).await?;

    Ok(ApiResponse::new(activity)
        .with_fragment(fragment(&state).await)
        .with_notification(Notification::success("Etkinlik başarıyla güncellendi!")))
}

/// DELETE /api/admin/activities/{id}?confirm=true - Delete an activity.
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<DeleteOutcome> {
    match state.content.activities.delete(id, query.confirmation()).await? {
        DeleteOutcome::Deleted => Ok(ApiResponse::new(DeleteOutcome::Deleted)
            .with_fragment(fragment(&state).await)
            .with_notification(Notification::info("Etkinlik silindi!"))),
        DeleteOutcome::Cancelled => success(DeleteOutcome::Cancelled),
    }
}
