//! Pushover-specific error type.

use homelog_domain::error::HomelogError;

/// Errors originating from the Pushover adapter.
#[derive(Debug, thiserror::Error)]
pub enum PushoverError {
    /// The request could not be sent or its response could not be read.
    #[error("pushover request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-JSON body and an error status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The API refused the request.
    #[error("request rejected: {}", errors.join(", "))]
    Rejected { errors: Vec<String> },

    /// The application token was refused.
    #[error("application token is invalid")]
    InvalidToken,

    /// No application token was configured.
    #[error("application token is missing")]
    MissingToken,
}

impl From<PushoverError> for HomelogError {
    fn from(err: PushoverError) -> Self {
        Self::Notification(Box::new(err))
    }
}
