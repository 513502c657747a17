//! Client configuration
//!
//! Each setting is resolved with the same priority everywhere:
//! 1. Explicit value (command line flag)
//! 2. Environment variable (if set and non-empty)
//! 3. Built-in default

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable for the API base URL
pub const API_URL_ENV: &str = "CANOPY_API_URL";

/// Environment variable for the public site URL used in registration links
pub const SITE_URL_ENV: &str = "CANOPY_SITE_URL";

/// Environment variable for the session cookie file
pub const SESSION_PATH_ENV: &str = "CANOPY_SESSION";

/// Environment variable for the base retry delay in milliseconds
pub const RETRY_DELAY_ENV: &str = "CANOPY_RETRY_DELAY_MS";

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Default public site URL
pub const DEFAULT_SITE_URL: &str = "https://asilocloud.ink";

/// Default base delay between read retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Session file location relative to the user config directory
const SESSION_FILE: &str = "canopy/session";

/// Resolved client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// API base URL including the `/api/v1` prefix
    pub api_url: String,
    /// Public site URL for registration links
    pub site_url: String,
    /// Where the session cookie is persisted between runs
    pub session_path: PathBuf,
    /// Base delay for exponential retry backoff
    pub retry_delay: Duration,
}

impl Config {
    /// Resolve the configuration from explicit overrides, environment and defaults.
    pub fn resolve(
        api_url: Option<String>,
        site_url: Option<String>,
        session_path: Option<PathBuf>,
    ) -> Self {
        Self {
            api_url: resolve_string(api_url, API_URL_ENV, DEFAULT_API_URL),
            site_url: resolve_string(site_url, SITE_URL_ENV, DEFAULT_SITE_URL),
            session_path: session_path
                .or_else(|| env_non_empty(SESSION_PATH_ENV).map(PathBuf::from))
                .unwrap_or_else(default_session_path),
            retry_delay: env_non_empty(RETRY_DELAY_ENV)
                .and_then(|ms| ms.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
        }
    }

    /// Configuration pointing at a specific server, used by tests and embedders.
    pub fn for_api(api_url: impl Into<String>, session_path: impl Into<PathBuf>) -> Self {
        Self {
            api_url: api_url.into(),
            site_url: DEFAULT_SITE_URL.to_string(),
            session_path: session_path.into(),
            retry_delay: Duration::ZERO,
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn resolve_string(explicit: Option<String>, env: &str, default: &str) -> String {
    explicit
        .or_else(|| env_non_empty(env))
        .unwrap_or_else(|| default.to_string())
}

/// Default session file path.
///
/// Uses the platform config directory (`~/.config/canopy/session` on Linux),
/// falling back to `.canopy/session` in the current directory.
pub fn default_session_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(SESSION_FILE),
        None => PathBuf::from(".canopy").join("session"),
    }
}
