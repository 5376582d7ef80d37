//! Ingest queue: bounded FIFO between network callbacks and the persistence worker.
//!
//! Any number of [`IngestSender`]s feed exactly one [`IngestReceiver`].
//! A full queue makes producers wait; nothing is ever dropped to make room.

use std::time::Duration;

use tokio::sync::mpsc;

use homelog_domain::error::HomelogError;
use homelog_domain::reading::Reading;

/// Default number of readings the queue holds before producers wait.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Create a bounded queue holding at most `capacity` readings.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn bounded(capacity: usize) -> (IngestSender, IngestReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (IngestSender { tx }, IngestReceiver { rx })
}

/// The reading could not be enqueued because the worker stopped accepting.
///
/// The reading is handed back so the caller decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("ingest queue closed")]
pub struct QueueClosed(pub Reading);

impl From<QueueClosed> for HomelogError {
    fn from(_: QueueClosed) -> Self {
        Self::QueueClosed
    }
}

/// Why [`IngestReceiver::try_take`] returned without a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// Nothing arrived within the timeout.
    Empty,
    /// Every sender is gone and the buffer is empty.
    Closed,
}

/// Producer handle. Cheap to clone, one per callback site.
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: mpsc::Sender<Reading>,
}

impl IngestSender {
    /// Enqueue a reading, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] once the worker has started draining.
    pub async fn put(&self, reading: Reading) -> Result<(), QueueClosed> {
        self.tx
            .send(reading)
            .await
            .map_err(|err| QueueClosed(err.0))
    }

    /// Enqueue from a plain OS thread, blocking it while the queue is full.
    ///
    /// This is what network callbacks use. It must not be called from
    /// within an async context.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] once the worker has started draining.
    pub fn put_blocking(&self, reading: Reading) -> Result<(), QueueClosed> {
        self.tx
            .blocking_send(reading)
            .map_err(|err| QueueClosed(err.0))
    }

    /// Number of pending readings. Racy; for observability only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the worker stopped accepting readings.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle, owned by the persistence worker.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: mpsc::Receiver<Reading>,
}

impl IngestReceiver {
    /// Take the next reading, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`TakeError::Empty`] when the timeout elapsed, [`TakeError::Closed`]
    /// when no producer is left and the buffer is empty.
    pub async fn try_take(&mut self, timeout: Duration) -> Result<Reading, TakeError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(reading)) => Ok(reading),
            Ok(None) => Err(TakeError::Closed),
            Err(_elapsed) => Err(TakeError::Empty),
        }
    }

    /// Refuse new readings while keeping the buffered ones.
    ///
    /// Producers waiting for capacity get [`QueueClosed`] back.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Next buffered reading after [`close`](Self::close), `None` once drained.
    pub async fn next_buffered(&mut self) -> Option<Reading> {
        self.rx.recv().await
    }

    /// Number of pending readings. Racy; for observability only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
