use thiserror::Error;

/// Failure kinds reported by the HTTP collaborators (model, search, document store).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("rate limited on every configured key")]
    RateLimited,

    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => ApiError::RateLimited,
            401 | 403 => ApiError::Auth { status },
            _ if body.to_ascii_lowercase().contains("rate_limit") => ApiError::RateLimited,
            _ => ApiError::Upstream {
                status,
                message: body.chars().take(500).collect(),
            },
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = err.status() {
            ApiError::from_status(status.as_u16(), &err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// The upstream failure kind, if this error came from an HTTP collaborator.
    pub fn api_kind(&self) -> Option<&ApiError> {
        match self {
            Error::Api(kind) => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
