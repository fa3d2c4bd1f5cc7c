//! Error handling for the Livoltek API client.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Authentication failed: empty token received")]
    EmptyToken,
    #[error("Authorization failed: token rejected by the server")]
    Unauthorized,

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[from] reqwest::Error),
    #[error("Request rejected: circuit breaker open")]
    RequestRejected,
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("API error: {0}")]
    ApiError(String),
    #[error("Response JSON error: {0}")]
    ResponseJsonError(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if new credentials are required to recover.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::AuthenticationFailed(_) | Error::EmptyToken)
    }

    /// Returns `true` if the same request may succeed when tried again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ConnectionFailed(err) => !is_client_error(err),
            Error::RequestRejected => true,
            _ => false,
        }
    }
}

/// Check if the error is a HTTP 4xx client error.
pub(crate) fn is_client_error(error: &reqwest::Error) -> bool {
    error
        .status()
        .map(|status_code| status_code.is_client_error())
        .unwrap_or(false)
}

pub type Result<T> = std::result::Result<T, Error>;
