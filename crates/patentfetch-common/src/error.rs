use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatentFetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, PatentFetchError>;
