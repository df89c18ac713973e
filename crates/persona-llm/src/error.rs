/// Errors that can occur when interacting with a language model vendor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(Box<dyn std::error::Error + Send + Sync>),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error ({code}): {message}")]
    Api { code: String, message: String },

    /// The vendor call succeeded transport-wise but produced no usable
    /// text. Treated as a failure so a silent empty result can never be
    /// mistaken for a real answer downstream.
    #[error("provider returned no text content")]
    EmptyResponse,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error(
        "no API key configured for {provider}; add one in settings or set {env_hint}"
    )]
    MissingApiKey { provider: String, env_hint: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
