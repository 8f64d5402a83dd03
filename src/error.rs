use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::distributions::BernoulliError;

/// Errors returned by the image gallery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration was read but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metric creation, registration or encoding failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// A call to an upstream API failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The page template is unusable.
    #[error("template error: {0}")]
    Template(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure probability outside of `[0, 1]`.
    #[error("invalid failure probability: {0}")]
    Probability(#[from] BernoulliError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Upstream(e) => {
                tracing::warn!(error = %e, url = ?e.url(), "upstream unavailable");
                StatusCode::BAD_GATEWAY
            }
            e => {
                tracing::error!(error = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = status.canonical_reason().unwrap_or("Error");
        (status, message).into_response()
    }
}
