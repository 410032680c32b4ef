use crate::client::ApiErrorBody;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Service error: {status}{}", describe_body(.body))]
    Service {
        status: u16,
        body: Option<ApiErrorBody>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_body(body: &Option<ApiErrorBody>) -> String {
    match body {
        Some(body) => format!(" ({}: {})", body.kind, body.message),
        None => String::new(),
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classifies a transport failure. `timeout_secs` is the bound the client was built with.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                seconds: timeout_secs,
            }
        } else {
            Self::Network(err)
        }
    }

    /// Whether a caller could reasonably try the same request again.
    /// The client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
