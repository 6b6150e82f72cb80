/// Shared error type used across all Alex crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database: {0}")]
    Database(String),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("path not allowed: {0}")]
    PathNotAllowed(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("trade validation failed: {0}")]
    TradeValidationFailed(String),

    #[error("trade expired: {0}")]
    TradeExpired(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
