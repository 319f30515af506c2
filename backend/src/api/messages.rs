//! Contact message endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{success, ApiResponse, ApiResult, DeleteQuery};
use crate::errors::AppError;
use crate::events::Notification;
use crate::models::{ContactMessage, MessageFilter};
use crate::render::render_admin_messages;
use crate::repository::DeleteOutcome;
use crate::AppState;

/// Read-state filter carried on the query string; the returned fragment
/// reflects it.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub filter: MessageFilter,
}

async fn fragment(state: &AppState, filter: MessageFilter) -> String {
    render_admin_messages(&state.content.messages.list_filtered(filter).await, filter)
}

/// GET /api/admin/messages?filter=all|unread|read - List messages, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<ContactMessage>> {
    success(state.content.messages.list_filtered(query.filter).await)
}

/// GET /api/admin/messages/{id} - Get a single message.
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ContactMessage> {
    match state.content.messages.get(id).await {
        Some(message) => success(message),
        None => Err(AppError::NotFound(format!("Message {} not found", id))),
    }
}

/// PUT /api/admin/messages/{id}/read - Mark a message read.
pub async fn mark_message_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<ContactMessage> {
    let message = state.content.messages.mark_read(id).await?;

    Ok(ApiResponse::new(message)
        .with_fragment(fragment(&state, query.filter).await)
        .with_notification(Notification::success("Mesaj okundu olarak işaretlendi!")))
}

/// PUT /api/admin/messages/{id}/unread - Mark a message unread.
pub async fn mark_message_unread(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<ContactMessage> {
    let message = state.content.messages.mark_unread(id).await?;

    Ok(ApiResponse::new(message)
        .with_fragment(fragment(&state, query.filter).await)
        .with_notification(Notification::info("Mesaj okunmadı olarak işaretlendi!")))
}

/// DELETE /api/admin/messages/{id}?confirm=true - Delete a message.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
    Query(filter): Query<FilterQuery>,
) -> ApiResult<DeleteOutcome> {
    match state.content.messages.delete(id, query.confirmation()).await? {
        DeleteOutcome::Deleted => Ok(ApiResponse::new(DeleteOutcome::Deleted)
            .with_fragment(fragment(&state, filter.filter).await)
            .with_notification(Notification::info("Mesaj silindi!"))),
        DeleteOutcome::Cancelled => success(DeleteOutcome::Cancelled),
    }
}
