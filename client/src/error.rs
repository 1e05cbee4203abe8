use thiserror::Error;

/// Failures reported to callers of [`crate::ApiClient`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// The server rejected the input (HTTP 400)
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// Login refused the username or password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Credentials are gone and the user must log in again
    #[error("Session expired")]
    SessionExpired,

    /// Connection failures and 5xx answers; retrying later may succeed
    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::TransientNetwork(e.to_string())
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
