use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoterError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Connection timed out: {0}")]
    ConnectionTimeout(String),

    #[error("Authentication rejected by gateway: {0}")]
    AuthRejected(String),

    #[error("Malformed quote request: {0}")]
    MalformedQuote(String),

    #[error("Quote handler failed: {0}")]
    Handler(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}
