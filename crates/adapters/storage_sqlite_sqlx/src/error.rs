//! Storage-specific error type wrapping sqlx errors.

use homelog_domain::error::HomelogError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database could not be opened, created, or initialised.
    #[error("database unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// A statement failed while the connection was open.
    #[error("database write failed")]
    Write(#[source] sqlx::Error),

    /// A query reading stored rows failed.
    #[error("database read failed")]
    Read(#[source] sqlx::Error),

    /// The store was already closed.
    #[error("database already closed")]
    Closed,
}

impl From<StorageError> for HomelogError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(source) => Self::StorageUnavailable(Box::new(source)),
            StorageError::Write(source) | StorageError::Read(source) => {
                Self::StorageWrite(Box::new(source))
            }
            StorageError::Closed => Self::StorageClosed,
        }
    }
}
