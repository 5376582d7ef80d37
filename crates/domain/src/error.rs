//! Common error type used across the workspace.
//!
//! Each layer defines its own typed errors (`StorageError`, `PushoverError`, …)
//! and converts into [`HomelogError`] at port boundaries.

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for homelog operations.
#[derive(Debug, thiserror::Error)]
pub enum HomelogError {
    /// The backing store could not be opened or created.
    #[error("storage unavailable")]
    StorageUnavailable(#[source] BoxError),

    /// A single append or flush failed.
    #[error("storage write failed")]
    StorageWrite(#[source] BoxError),

    /// An operation was attempted on a store that was already closed.
    #[error("storage already closed")]
    StorageClosed,

    /// The ingest queue no longer accepts readings.
    #[error("ingest queue closed")]
    QueueClosed,

    /// The notification transport failed.
    #[error("notification failed")]
    Notification(#[source] BoxError),

    /// The device network reported a failure.
    #[error("network error: {0}")]
    Network(String),

    /// The persistence worker task panicked or was aborted.
    #[error("persistence worker crashed")]
    WorkerCrashed,
}

impl HomelogError {
    /// Whether this error means the data pipeline cannot continue.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_)
                | Self::StorageWrite(_)
                | Self::StorageClosed
                | Self::WorkerCrashed
        )
    }
}
