//! Renkli Dünya kindergarten site backend
//!
//! Serves the public site and the admin panel, with every collection kept in
//! a SQLite-backed key-value store.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod events;
mod models;
mod render;
mod repository;
mod security;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{GuardSettings, SessionGuard};
use config::{Config, LogFormat};
use db::Store;
use errors::AppError;
use events::{EventSink, TracingEvents};
use repository::Content;
use security::ContactLimiter;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub content: Arc<Content>,
    pub guard: Arc<SessionGuard>,
    pub events: Arc<dyn EventSink>,
    pub contact_limiter: Arc<ContactLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the store and load every collection.
    pub async fn build(config: Config, events: Arc<dyn EventSink>) -> Result<Self, sqlx::Error> {
        let pool = db::init_database(&config.db_path).await?;
        let store = Store::new(pool, config.storage_prefix.clone(), config.max_storage_bytes);

        let content = Arc::new(Content::open(store.clone(), config.message_retention).await);
        let guard = Arc::new(SessionGuard::new(store.clone(), GuardSettings::from(&config)));
        let contact_limiter = Arc::new(ContactLimiter::new(config.contact_interval));

        Ok(Self {
            store,
            content,
            guard,
            events,
            contact_limiter,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Starting {} backend", config.site_name);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let bind_addr = config.bind_addr;
    let autosave_interval = config.autosave_interval;

    let state = AppState::build(config, Arc::new(TracingEvents)).await?;
    if !state.guard.is_configured().await {
        tracing::warn!("Admin credentials not configured; default credentials are accepted");
    }

    if autosave_interval.is_zero() {
        tracing::info!("Autosave disabled");
    } else {
        tokio::spawn(run_autosave(state.content.clone(), autosave_interval));
    }

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    // Peer addresses key the contact form limit.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Re-persist every collection on a fixed period.
async fn run_autosave(content: Arc<Content>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; collections were just loaded.
    interval.tick().await;

    loop {
        interval.tick().await;
        content.persist_all().await;
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    // Public site
    let public_routes = Router::new()
        .route("/", get(api::public_page))
        .route("/fragments/activities", get(api::public_activities_fragment))
        .route("/fragments/blog", get(api::public_blog_fragment))
        .route("/api/public/activities", get(api::public_activities))
        .route("/api/public/blog", get(api::public_blog_posts))
        .route("/api/contact", post(api::submit_contact));

    // Admin session handling (no session required)
    let session_routes = Router::new()
        .route("/api/admin/session", get(api::session_state))
        .route("/api/admin/setup", post(api::setup_credentials))
        .route("/api/admin/login", post(api::login))
        .route("/api/admin/logout", post(api::logout))
        .route("/api/admin/password-strength", post(api::check_password_strength));

    // Admin panel (session required)
    let admin_routes = Router::new()
        .route("/api/admin/password", post(api::change_password))
        .route("/api/admin/reset", post(api::reset_credentials))
        .route("/api/admin/stats", get(api::dashboard_stats))
        .route("/api/admin/export", get(api::export_data))
        // Activities
        .route(
            "/api/admin/activities",
            get(api::list_activities).post(api::create_activity),
        )
        .route(
            "/api/admin/activities/{id}",
            get(api::get_activity)
                .put(api::update_activity)
                .delete(api::delete_activity),
        )
        // Blog
        .route(
            "/api/admin/blog",
            get(api::list_blog_posts).post(api::create_blog_post),
        )
        .route(
            "/api/admin/blog/{id}",
            get(api::get_blog_post)
                .put(api::update_blog_post)
                .delete(api::delete_blog_post),
        )
        // Messages
        .route("/api/admin/messages", get(api::list_messages))
        .route(
            "/api/admin/messages/{id}",
            get(api::get_message).delete(api::delete_message),
        )
        .route("/api/admin/messages/{id}/read", put(api::mark_message_read))
        .route("/api/admin/messages/{id}/unread", put(api::mark_message_unread))
        // Fragments
        .route("/admin/fragments/activities", get(api::admin_activities_fragment))
        .route("/admin/fragments/blog", get(api::admin_blog_fragment))
        .route("/admin/fragments/messages", get(api::admin_messages_fragment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    AppError::Internal("Internal server error".to_string()).into_response()
}

#[cfg(test)]
mod tests;
