use std::path::PathBuf;
use std::time::Duration;

/// Default backend address for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash.
    pub backend_url: String,
    /// Upper bound on any single request.
    pub request_timeout: Duration,
    /// Explicit token file location. `None` uses the platform config dir.
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                              |
    /// |--------------------------------|--------------------------------------|
    /// | `TERROIR_BACKEND_URL`          | `http://localhost:8000`              |
    /// | `TERROIR_REQUEST_TIMEOUT_SECS` | `30`                                 |
    /// | `TERROIR_TOKEN_PATH`           | `<config dir>/terroir/access_token`  |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup("TERROIR_BACKEND_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());

        let request_timeout_secs = match lookup("TERROIR_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default = DEFAULT_REQUEST_TIMEOUT_SECS,
                        "TERROIR_REQUEST_TIMEOUT_SECS is not a positive integer, using default",
                    );
                    DEFAULT_REQUEST_TIMEOUT_SECS
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let token_path = lookup("TERROIR_TOKEN_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            backend_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            token_path,
        }
    }
}
