use thiserror::Error;

/// Failures talking to the hub over HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the session is missing or expired.
    #[error("login required")]
    Unauthorized,
    /// Any other non-2xx status. `reason` is the canonical status text.
    #[error("{reason}")]
    Status { code: u16, reason: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 2xx, but the body was not the JSON we expected.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid session cookie")]
    InvalidCookie,
}

impl ApiError {
    /// True for errors that mean the hub could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }
}
