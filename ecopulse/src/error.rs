//! Error types for the API client and settings resolution.

use thiserror::Error;

/// Every way a request to the metrics API can fail. The monitor collapses all
/// of them into a single "fetch failed" outcome and keeps only the message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: &'static str },

    #[error("could not reach {endpoint}: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("malformed {endpoint} payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not load CA certificate: {0}")]
    Certificate(String),
}

impl ApiError {
    pub(crate) fn from_transport(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ApiError::Timeout { endpoint }
        } else {
            ApiError::Transport { endpoint, source }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme '{0}' (expected http or https)")]
    Scheme(String),

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}
