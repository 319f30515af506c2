//! Admin session, credential, dashboard and fragment endpoints.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use super::{success, ApiResponse, ApiResult, FilterQuery};
use crate::auth::{password_strength, session_token};
use crate::errors::AppError;
use crate::events::Notification;
use crate::models::{
    ChangePasswordRequest, DashboardStats, LoginRequest, PasswordStrength,
    PasswordStrengthRequest, SessionGrant, SessionState, SetupRequest,
};
use crate::render::{render_admin_activities, render_admin_blog_posts, render_admin_messages};
use crate::AppState;

/// GET /api/admin/session - Which screen the admin panel should show.
pub async fn session_state(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SessionState> {
    let token = session_token(&headers);
    success(state.guard.state(token.as_deref()).await)
}

/// POST /api/admin/setup - First-run credential configuration.
pub async fn setup_credentials(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> ApiResult<SessionGrant> {
    let grant = state.guard.setup(request).await?;

    Ok(ApiResponse::new(grant)
        .with_notification(Notification::success("Güvenlik ayarları başarıyla kaydedildi!")))
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionGrant> {
    match state.guard.login(request).await {
        Ok(grant) => {
            state
                .events
                .track_event("user_interaction", json!({"action": "admin_login", "success": true}));
            Ok(ApiResponse::new(grant)
                .with_notification(Notification::success("Başarıyla giriş yapıldı!")))
        }
        Err(e) => {
            state
                .events
                .track_event("user_interaction", json!({"action": "admin_login", "success": false}));
            Err(e)
        }
    }
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Some(token) = session_token(&headers) {
        state.guard.logout(&token);
    }

    Ok(ApiResponse::new(()).with_notification(Notification::info("Başarıyla çıkış yapıldı!")))
}

/// POST /api/admin/password-strength - Rate a candidate password.
pub async fn check_password_strength(
    Json(request): Json<PasswordStrengthRequest>,
) -> ApiResult<PasswordStrength> {
    success(password_strength(&request.password))
}

/// POST /api/admin/password - Change the admin password.
pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    state.guard.change_password(request).await?;

    Ok(ApiResponse::new(()).with_notification(Notification::success("Şifre başarıyla değiştirildi!")))
}

/// POST /api/admin/reset - Forget the configured credentials.
pub async fn reset_credentials(State(state): State<AppState>) -> ApiResult<()> {
    state.guard.reset().await?;

    Ok(ApiResponse::new(()).with_notification(Notification::info(
        "Güvenlik ayarları sıfırlandı. Varsayılan bilgilerle giriş yapabilirsiniz.",
    )))
}

/// GET /api/admin/stats - Dashboard counters.
pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    success(state.content.stats().await)
}

/// GET /api/admin/export - Download every collection as one JSON document.
pub async fn export_data(State(state): State<AppState>) -> Result<Response, AppError> {
    let document = state.content.export().await;
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::Internal(format!("Failed to encode export: {}", e)))?;

    let filename = format!(
        "attachment; filename=\"anaokulu-backup-{}.json\"",
        Utc::now().format("%Y-%m-%d")
    );
    let disposition = HeaderValue::from_str(&filename)
        .map_err(|e| AppError::Internal(format!("Invalid export header: {}", e)))?;

    tracing::info!(
        activities = document.activities.len(),
        blog_posts = document.blog_posts.len(),
        messages = document.contact_messages.len(),
        "Exported site data"
    );

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /admin/fragments/activities
pub async fn admin_activities_fragment(State(state): State<AppState>) -> Html<String> {
    Html(render_admin_activities(&state.content.activities.list().await))
}

/// GET /admin/fragments/blog
pub async fn admin_blog_fragment(State(state): State<AppState>) -> Html<String> {
    Html(render_admin_blog_posts(&state.content.blog_posts.list().await))
}

/// GET /admin/fragments/messages?filter=all|unread|read
pub async fn admin_messages_fragment(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Html<String> {
    let messages = state.content.messages.list_filtered(query.filter).await;
    Html(render_admin_messages(&messages, query.filter))
}
