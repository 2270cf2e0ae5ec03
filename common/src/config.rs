use crate::error::{IntelliSqlError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DB_PATH: &str = "data.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Runtime settings handed to the pipeline and the store.
///
/// `api_key` is the only required value. When it is missing the process keeps
/// running: callers surface [`Settings::credential_warning`] and every
/// generation request fails with a configuration error.
#[derive(Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub db_path: PathBuf,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("db_path", &self.db_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn credential_warning(&self) -> Option<String> {
        match self.api_key() {
            Ok(_) => None,
            Err(_) => Some(
                "API_KEY not found; questions cannot be translated until it is set".to_string(),
            ),
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| IntelliSqlError::Config("API_KEY is not configured".to_string()))
    }
}
