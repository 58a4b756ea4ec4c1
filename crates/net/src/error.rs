//! Network error types

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    /// 401 or 403 from the service
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// 400 or 422 from the service, or refused before sending
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Any other non-success status
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Message content is empty")]
    EmptyContent,

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Classify a non-success status code
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Unauthorized { status, message },
            400 | 422 => Error::Rejected { status, message },
            _ => Error::Status { status, message },
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_decode() {
            Error::Protocol(err.to_string())
        } else {
            Error::Http(err)
        }
    }
}

impl From<Error> for stayspot_core::Error {
    fn from(err: Error) -> Self {
        use stayspot_core::Error as Core;
        match err {
            Error::Unauthorized { message, .. } => Core::Auth(message),
            Error::Rejected { message, .. } => Core::Validation(message),
            Error::NotAuthenticated => Core::NotAuthenticated,
            Error::EmptyContent => Core::Validation("message content is empty".into()),
            Error::InvalidUrl(url) => Core::Config(format!("invalid API URL: {url}")),
            other => Core::Network(other.to_string()),
        }
    }
}
