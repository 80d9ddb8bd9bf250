use terroir_core::error::CoreError;

/// Errors from talking to the game backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend rejected the bearer token (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend returned a non-2xx status.
    #[error("Backend error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `detail` / `message` from the body, or a generic status line.
        detail: String,
    },

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A 2xx body did not match the expected shape.
    #[error("Unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The token could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// No token is stored; the player has to log in first.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Local validation or state error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Text shown to the player for this error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized(msg) | ClientError::Api { detail: msg, .. } => msg.clone(),
            ClientError::Request(e) if e.is_timeout() => "The server took too long to respond".into(),
            ClientError::Request(_) => "Could not reach the game server".into(),
            ClientError::Decode { .. } => "The game server sent an unexpected response".into(),
            ClientError::Storage(e) => format!("Could not access the saved login: {e}"),
            ClientError::NotLoggedIn => "Please log in".into(),
            ClientError::Core(e) => e.to_string(),
        }
    }
}

/// Generic message when the backend gave no `detail`.
pub fn status_message(status: u16) -> String {
    format!("HTTP error! status: {status}")
}
