//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// A signed-in session older than this is force-expired at launch.
///
/// Fixed business rule, deliberately not read from the environment.
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID (Firestore database and token audience)
    pub firebase_project_id: String,
    /// Firebase Storage bucket for profile photos
    pub storage_bucket: String,
    /// UI shell origin allowed by CORS
    pub frontend_url: String,
    /// Local API port
    pub port: u16,
    /// Directory holding the local session marker
    pub data_dir: PathBuf,
    /// Upper bound for every remote store operation
    pub store_timeout: Duration,
    /// Shared HS256 secret accepted instead of provider-signed tokens.
    /// Only meant for local development against the emulators.
    pub auth_dev_secret: Option<Vec<u8>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        if firebase_project_id.is_empty() {
            return Err(ConfigError::Missing("FIREBASE_PROJECT_ID"));
        }

        let storage_bucket = env::var("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.appspot.com", firebase_project_id));

        let store_timeout_secs = match env::var("STORE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("STORE_TIMEOUT_SECS", raw))?,
            Err(_) => DEFAULT_STORE_TIMEOUT_SECS,
        };

        Ok(Self {
            firebase_project_id,
            storage_bucket,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_dir: env::var("MANDATO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".mandato360")),
            store_timeout: Duration::from_secs(store_timeout_secs),
            auth_dev_secret: env::var("AUTH_DEV_SECRET")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(String::into_bytes),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_dir: env::temp_dir().join("mandato360-test"),
            store_timeout: Duration::from_secs(2),
            auth_dev_secret: Some(b"test_auth_secret_32_bytes_minimum".to_vec()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
