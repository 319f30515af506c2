//! Configuration module for the kindergarten site backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Output format for the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file backing the key-value store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Display name used in the public page shell
    pub site_name: String,
    /// Prefix applied to every key in the store
    pub storage_prefix: String,
    /// Upper bound on the total size of all stored values, in bytes
    pub max_storage_bytes: usize,
    /// Consecutive failed logins before the guard locks
    pub max_login_attempts: u32,
    /// How long the guard stays locked
    pub lockout_duration: Duration,
    /// Idle lifetime of an admin session
    pub session_timeout: Duration,
    /// Minimum admin password length
    pub password_min_length: usize,
    /// Maximum number of contact messages retained
    pub message_retention: usize,
    /// Minimum spacing between two contact form submissions
    pub contact_interval: Duration,
    /// Artificial delay before acknowledging a contact submission
    pub contact_delay: Duration,
    /// Period of the background re-persist task
    pub autosave_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/site.sqlite"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            site_name: "Renkli Dünya Anaokulu".to_string(),
            storage_prefix: String::new(),
            max_storage_bytes: 10 * 1024 * 1024,
            max_login_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            session_timeout: Duration::from_secs(30 * 60),
            password_min_length: 6,
            message_retention: 1000,
            contact_interval: Duration::from_secs(30),
            contact_delay: Duration::from_millis(2000),
            autosave_interval: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let db_path = env::var("KG_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let bind_addr = env::var("KG_BIND_ADDR")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    eprintln!("Invalid KG_BIND_ADDR format: {}, using default", v);
                    None
                }
            })
            .unwrap_or(defaults.bind_addr);

        let log_level = env::var("KG_LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_format = match env::var("KG_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            site_name: env::var("KG_SITE_NAME").unwrap_or(defaults.site_name),
            storage_prefix: env::var("KG_STORAGE_PREFIX").unwrap_or(defaults.storage_prefix),
            max_storage_bytes: env_parse("KG_MAX_STORAGE_BYTES", defaults.max_storage_bytes),
            max_login_attempts: env_parse("KG_MAX_LOGIN_ATTEMPTS", defaults.max_login_attempts),
            lockout_duration: Duration::from_secs(env_parse(
                "KG_LOCKOUT_SECS",
                defaults.lockout_duration.as_secs(),
            )),
            session_timeout: Duration::from_secs(env_parse(
                "KG_SESSION_TIMEOUT_SECS",
                defaults.session_timeout.as_secs(),
            )),
            password_min_length: env_parse(
                "KG_PASSWORD_MIN_LENGTH",
                defaults.password_min_length,
            ),
            message_retention: env_parse("KG_MESSAGE_RETENTION", defaults.message_retention),
            contact_interval: Duration::from_secs(env_parse(
                "KG_CONTACT_INTERVAL_SECS",
                defaults.contact_interval.as_secs(),
            )),
            contact_delay: Duration::from_millis(env_parse(
                "KG_CONTACT_DELAY_MS",
                defaults.contact_delay.as_millis() as u64,
            )),
            autosave_interval: Duration::from_secs(env_parse(
                "KG_AUTOSAVE_SECS",
                defaults.autosave_interval.as_secs(),
            )),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
