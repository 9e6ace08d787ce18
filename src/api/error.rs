//! Errors from the approval service.

use thiserror::Error;

/// Broad classes of failure, used to pick what to show the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session is missing or invalid
    Unauthorized,
    /// The session is valid but lacks the required clearance
    Forbidden,
    /// The service could not be reached or answered garbage
    Transport,
    /// The service answered, but reported the operation as failed
    ServerLogical,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized (HTTP 401)")]
    Unauthorized,

    #[error("insufficient privilege (HTTP 403)")]
    Forbidden,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    ServerLogical(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::Forbidden => ErrorKind::Forbidden,
            ApiError::Status { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                ErrorKind::Transport
            }
            ApiError::ServerLogical(_) => ErrorKind::ServerLogical,
        }
    }

    /// Map an HTTP status outside 2xx to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            _ => ApiError::Status { status, body },
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthorized | ErrorKind::Forbidden)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
