//! HTTP handlers.
//!
//! Admin mutations answer with the changed record, the re-rendered list
//! fragment and a notification, so the page can swap the list container
//! without another round trip.

mod activities;
mod admin;
mod blog;
mod messages;
mod site;

pub use activities::*;
pub use admin::*;
pub use blog::*;
pub use messages::*;
pub use site::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::events::Notification;
use crate::repository::Confirmation;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            fragment: None,
            notification: None,
        }
    }

    pub fn with_fragment(mut self, html: String) -> Self {
        self.fragment = Some(html);
        self
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Query string of a delete request. Without `confirm=true` nothing is removed.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl DeleteQuery {
    pub fn confirmation(&self) -> Confirmation {
        Confirmation::from(self.confirm)
    }
}
