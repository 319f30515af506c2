//! Public site: page, fragments, read-only snapshots and the contact form.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::Html,
    Json,
};
use serde_json::json;

use super::{success, ApiResponse, ApiResult};
use crate::errors::AppError;
use crate::events::Notification;
use crate::models::{Activity, BlogPost, ClientInfo, ContactDraft, ContactRequest};
use crate::render::{render_public_activities, render_public_blog_posts, render_public_page};
use crate::AppState;

/// GET / - Public page.
pub async fn public_page(State(state): State<AppState>) -> Html<String> {
    Html(render_public_page(
        &state.config.site_name,
        &state.content.activities.list().await,
        &state.content.blog_posts.list().await,
    ))
}

/// GET /fragments/activities
pub async fn public_activities_fragment(State(state): State<AppState>) -> Html<String> {
    Html(render_public_activities(&state.content.activities.list().await))
}

/// GET /fragments/blog
pub async fn public_blog_fragment(State(state): State<AppState>) -> Html<String> {
    Html(render_public_blog_posts(&state.content.blog_posts.list().await))
}

/// GET /api/public/activities
pub async fn public_activities(State(state): State<AppState>) -> ApiResult<Vec<Activity>> {
    success(state.content.activities.list().await)
}

/// GET /api/public/blog
pub async fn public_blog_posts(State(state): State<AppState>) -> ApiResult<Vec<BlogPost>> {
    success(state.content.blog_posts.list().await)
}

/// Client metadata from the request. The address comes from the first
/// `X-Forwarded-For` hop, else the connecting peer.
fn client_info(headers: &HeaderMap, peer: Option<IpAddr>) -> ClientInfo {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };

    ClientInfo {
        ip: header_value("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty())
            .or_else(|| peer.map(|ip| ip.to_string())),
        user_agent: header_value(header::USER_AGENT.as_str()),
    }
}

/// POST /api/contact - Leave a message for the staff.
pub async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ContactRequest>,
) -> ApiResult<()> {
    if let Err(e) = request.validate() {
        state
            .events
            .track_event("form_submission", json!({"form_name": "contact", "success": false}));
        return Err(e);
    }

    let client = client_info(&headers, Some(peer.ip()));
    let client_key = client.ip.clone().unwrap_or_else(|| "unknown".to_string());

    if !state.contact_limiter.check_and_record(&client_key) {
        tracing::warn!(client = %client_key, "Contact form submitted too soon after the previous one");
        return Err(AppError::RateLimited(
            "Çok sık mesaj gönderiyorsunuz. Lütfen bekleyin.".to_string(),
        ));
    }

    let message = match state.content.messages.create(ContactDraft { request, client }).await {
        Ok(message) => message,
        Err(e) => {
            state.contact_limiter.release(&client_key);
            state
                .events
                .track_event("form_submission", json!({"form_name": "contact", "success": false}));
            return Err(e);
        }
    };

    state.events.track_event(
        "form_submission",
        json!({"form_name": "contact", "success": true, "id": message.id}),
    );

    if !state.config.contact_delay.is_zero() {
        tokio::time::sleep(state.config.contact_delay).await;
    }

    Ok(ApiResponse::new(()).with_notification(Notification::success("Mesajınız başarıyla gönderildi!")))
}
