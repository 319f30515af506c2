//! Admin panel models: credentials, session state and dashboard data.

use serde::{Deserialize, Serialize};

use super::{Activity, BlogPost, ContactMessage};

/// Credentials record persisted under `adminCredentials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Where the admin panel stands for the requesting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    NeedsCredentialSetup,
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// First-run credential setup form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Issued on successful login or setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordStrengthRequest {
    #[serde(default)]
    pub password: String,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub activities: usize,
    pub blog_posts: usize,
    pub messages: usize,
    pub unread_messages: usize,
}

/// Backup document offered for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub activities: Vec<Activity>,
    pub blog_posts: Vec<BlogPost>,
    pub contact_messages: Vec<ContactMessage>,
    pub export_date: String,
}
