/// Result alias that carries the custom [`LightsError`] type.
pub type Result<T> = std::result::Result<T, LightsError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LightsError {
    /// Free-form failure raised by the crate itself (bad payloads, closed
    /// channels, invalid configuration values).
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    /// The telemetry endpoint did not answer: the request timed out or the
    /// connection was refused.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
}

impl LightsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Whether this failure means "nothing is listening", as opposed to a
    /// transient failure that should be retried quickly.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

impl From<&str> for LightsError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LightsError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
