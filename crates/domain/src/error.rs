/// Shared error type used across all chitthi crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP: {0}")]
    Http(String),

    /// A vendor call failed (non-2xx, malformed body, transport error).
    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// An adapter was asked to do work without its credential.
    #[error("configuration: {0}")]
    Configuration(String),

    /// No registered adapter can serve the requested model identifier.
    #[error("provider not available for model: {0}")]
    UnavailableProvider(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("store: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
