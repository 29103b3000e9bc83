use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Repository(#[from] rusqlite::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    Parse(String),

    #[error("No feeds available to fetch")]
    NoFeedsAvailable,

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatorError {
    /// Errors that only affect a single fetch cycle.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, GatorError::Network(_) | GatorError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, GatorError>;
