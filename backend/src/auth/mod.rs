//! Admin session guard.
//!
//! Gates the admin API behind a login. The guard walks through three states:
//! credentials not yet configured, logged out, and logged in (a live session
//! token). Consecutive failed logins are counted globally and lock the login
//! for a while once the configured threshold is reached.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{
    ChangePasswordRequest, LoginRequest, PasswordStrength, SessionGrant, SessionState,
    SetupRequest, StoredCredentials,
};
use crate::AppState;

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Store key of the credentials record.
pub const CREDENTIALS_KEY: &str = "adminCredentials";
/// Store key of the "credentials configured" flag.
pub const SETUP_FLAG_KEY: &str = "adminPasswordSetup";

/// Credentials accepted while none have been configured.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

const MIN_USERNAME_LENGTH: usize = 3;

/// Tunables taken from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct GuardSettings {
    pub max_login_attempts: u32,
    pub lockout_duration: Duration,
    pub session_timeout: Duration,
    pub password_min_length: usize,
}

impl From<&Config> for GuardSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_login_attempts: config.max_login_attempts,
            lockout_duration: config.lockout_duration,
            session_timeout: config.session_timeout,
            password_min_length: config.password_min_length,
        }
    }
}

#[derive(Debug, Default)]
struct LoginAttempts {
    failures: u32,
    locked_until: Option<Instant>,
}

/// Login, lockout and session bookkeeping for the admin panel.
pub struct SessionGuard {
    store: Store,
    settings: GuardSettings,
    /// Session token to expiry.
    sessions: Mutex<HashMap<String, Instant>>,
    attempts: Mutex<LoginAttempts>,
}

impl SessionGuard {
    pub fn new(store: Store, settings: GuardSettings) -> Self {
        Self {
            store,
            settings,
            sessions: Mutex::new(HashMap::new()),
            attempts: Mutex::new(LoginAttempts::default()),
        }
    }

    /// Current state as seen by the holder of `token`.
    pub async fn state(&self, token: Option<&str>) -> SessionState {
        if token.is_some_and(|t| self.is_active_at(t, Instant::now())) {
            SessionState::LoggedIn
        } else if self.is_configured().await {
            SessionState::LoggedOut
        } else {
            SessionState::NeedsCredentialSetup
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.store.get::<String>(SETUP_FLAG_KEY).await.as_deref() == Some("true")
    }

    /// Configure the initial credentials and open a session for them.
    pub async fn setup(&self, request: SetupRequest) -> Result<SessionGrant, AppError> {
        if self.is_configured().await {
            return Err(AppError::Conflict(
                "Admin credentials are already configured".to_string(),
            ));
        }

        if request.username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(AppError::validation(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LENGTH
            )));
        }
        self.check_new_password(&request.password, &request.confirm_password)?;

        self.save_credentials(request.username.clone(), request.password)
            .await?;

        tracing::info!(username = %request.username, "Admin credentials configured");
        Ok(self.open_session(Instant::now()))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<SessionGrant, AppError> {
        self.login_at(request, Instant::now()).await
    }

    async fn login_at(&self, request: LoginRequest, now: Instant) -> Result<SessionGrant, AppError> {
        self.check_lockout(now)?;

        let accepted = self
            .verify_credentials(&request.username, &request.password)
            .await?;

        if accepted {
            *self.lock_attempts() = LoginAttempts::default();
            tracing::info!("Admin logged in");
            return Ok(self.open_session(now));
        }

        let mut attempts = self.lock_attempts();
        attempts.failures += 1;
        if attempts.failures >= self.settings.max_login_attempts {
            attempts.locked_until = Some(now + self.settings.lockout_duration);
            tracing::warn!(
                failures = attempts.failures,
                "Admin login locked for {:?}",
                self.settings.lockout_duration
            );
        } else {
            tracing::warn!(failures = attempts.failures, "Admin login failed");
        }

        Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ))
    }

    pub fn logout(&self, token: &str) {
        if self.lock_sessions().remove(token).is_some() {
            tracing::info!("Admin logged out");
        }
    }

    /// Whether `token` names a live session. A live session's expiry is pushed out.
    pub fn is_active(&self, token: &str) -> bool {
        self.is_active_at(token, Instant::now())
    }

    fn is_active_at(&self, token: &str, now: Instant) -> bool {
        let mut sessions = self.lock_sessions();
        match sessions.get_mut(token) {
            Some(expires_at) if *expires_at > now => {
                *expires_at = now + self.settings.session_timeout;
                true
            }
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Replace the password, keeping the username.
    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<(), AppError> {
        let stored = self.store.get::<StoredCredentials>(CREDENTIALS_KEY).await;

        let current_ok = match &stored {
            Some(credentials) => {
                verify_password(request.current_password.clone(), credentials.password_hash.clone())
                    .await?
            }
            None => constant_time_compare(&request.current_password, DEFAULT_PASSWORD),
        };
        if !current_ok {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        self.check_new_password(&request.new_password, &request.confirm_password)?;

        let username = stored
            .map(|c| c.username)
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        self.save_credentials(username, request.new_password).await?;

        tracing::info!("Admin password changed");
        Ok(())
    }

    /// Forget the configured credentials and end every session.
    pub async fn reset(&self) -> Result<(), AppError> {
        self.store.remove(CREDENTIALS_KEY).await?;
        self.store.remove(SETUP_FLAG_KEY).await?;
        self.lock_sessions().clear();
        *self.lock_attempts() = LoginAttempts::default();
        tracing::warn!("Admin credentials reset");
        Ok(())
    }

    fn check_lockout(&self, now: Instant) -> Result<(), AppError> {
        let mut attempts = self.lock_attempts();
        match attempts.locked_until {
            Some(until) if now < until => {
                let remaining = until - now;
                Err(AppError::LockedOut {
                    retry_after_secs: remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0),
                })
            }
            Some(_) => {
                *attempts = LoginAttempts::default();
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_new_password(&self, password: &str, confirm: &str) -> Result<(), AppError> {
        if password.chars().count() < self.settings.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                self.settings.password_min_length
            )));
        }
        if password != confirm {
            return Err(AppError::validation("Passwords do not match"));
        }
        Ok(())
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> Result<bool, AppError> {
        match self.store.get::<StoredCredentials>(CREDENTIALS_KEY).await {
            Some(credentials) => {
                if !constant_time_compare(username, &credentials.username) {
                    return Ok(false);
                }
                verify_password(password.to_string(), credentials.password_hash).await
            }
            None => Ok(constant_time_compare(username, DEFAULT_USERNAME)
                & constant_time_compare(password, DEFAULT_PASSWORD)),
        }
    }

    async fn save_credentials(&self, username: String, password: String) -> Result<(), AppError> {
        let password_hash = hash_password(password).await?;
        self.store
            .set(
                CREDENTIALS_KEY,
                &StoredCredentials {
                    username,
                    password_hash,
                },
            )
            .await?;
        self.store.set(SETUP_FLAG_KEY, "true").await
    }

    fn open_session(&self, now: Instant) -> SessionGrant {
        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.lock_sessions();
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(token.clone(), now + self.settings.session_timeout);

        SessionGrant {
            token,
            expires_in_secs: self.settings.session_timeout.as_secs(),
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_attempts(&self) -> std::sync::MutexGuard<'_, LoginAttempts> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hash) else {
            tracing::warn!("Stored admin password hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

/// Score a password: one point each for length of at least 6, a lowercase
/// letter, an uppercase letter, a digit and a symbol.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= 6,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];

    match checks.iter().filter(|&&passed| passed).count() {
        0..=2 => PasswordStrength::Weak,
        3 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}

/// Session token from `x-session-token` or an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.trim().to_string())
}

/// Middleware rejecting requests without a live admin session.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match session_token(request.headers()) {
        Some(token) if state.guard.is_active(&token) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Session expired or invalid".to_string()).into_response(),
        None => AppError::Unauthorized("Login required".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
