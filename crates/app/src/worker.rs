//! Persistence worker: the single consumer of the ingest queue.
//!
//! The worker owns the [`ReadingStore`] for its whole run. It appends every
//! reading as soon as it is taken, commits on a timer, and drains the queue
//! before closing the store when asked to stop.
//!
//! ```text
//! Running ──(stop requested, queue idle │ all producers gone)──▶ Draining ──▶ Stopped
//! ```

use std::time::Duration;

use tokio::time::Instant;

use homelog_domain::error::HomelogError;
use homelog_domain::reading::Reading;

use crate::ingest::{IngestReceiver, TakeError};
use crate::lifecycle::Lifecycle;
use crate::ports::ReadingStore;

/// Timing knobs for the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// How long one `try_take` waits before the worker checks its timers.
    pub poll_timeout: Duration,
    /// Maximum time appended readings may stay uncommitted.
    pub commit_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            commit_interval: Duration::from_secs(30),
        }
    }
}

/// States of the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Draining,
    Stopped,
}

/// What a worker did during its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Readings appended to the store, drained ones included.
    pub appended: u64,
    /// Readings appended while draining.
    pub drained: u64,
    /// Timer-driven commits (the final commit done by `close` is not counted).
    pub flushes: u64,
}

/// Sole writer to a [`ReadingStore`].
pub struct PersistenceWorker<S> {
    store: S,
    receiver: IngestReceiver,
    lifecycle: Lifecycle,
    config: WorkerConfig,
    last_commit: Instant,
    report: WorkerReport,
}

impl<S: ReadingStore> PersistenceWorker<S> {
    /// Create a worker that takes ownership of `store` and `receiver`.
    pub fn new(
        store: S,
        receiver: IngestReceiver,
        lifecycle: Lifecycle,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            receiver,
            lifecycle,
            config,
            last_commit: Instant::now(),
            report: WorkerReport::default(),
        }
    }

    /// The flag this worker observes.
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Run until stopped, then close the store.
    ///
    /// The store is closed exactly once on every exit path, including after
    /// an append or flush failure.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered. Failed writes are not
    /// retried; restarting is the caller's decision.
    #[tracing::instrument(name = "persistence_worker", skip_all)]
    pub async fn run(mut self) -> Result<WorkerReport, HomelogError> {
        tracing::info!(config = ?self.config, "persistence worker started");
        self.last_commit = Instant::now();

        let outcome = self.pump().await;
        let closed = self.store.close().await;

        match (outcome, closed) {
            (Ok(()), Ok(())) => {
                tracing::info!(
                    appended = self.report.appended,
                    drained = self.report.drained,
                    flushes = self.report.flushes,
                    "persistence worker stopped"
                );
                Ok(self.report)
            }
            (Ok(()), Err(err)) => {
                tracing::error!(error = %err, "failed to close storage");
                Err(err)
            }
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    tracing::error!(
                        error = %close_err,
                        "failed to close storage after write failure"
                    );
                }
                tracing::error!(
                    error = %err,
                    appended = self.report.appended,
                    "persistence worker failed"
                );
                Err(err)
            }
        }
    }

    async fn pump(&mut self) -> Result<(), HomelogError> {
        let mut state = WorkerState::Running;
        loop {
            state = match state {
                WorkerState::Running => self.step().await?,
                WorkerState::Draining => {
                    self.drain().await?;
                    WorkerState::Stopped
                }
                WorkerState::Stopped => return Ok(()),
            };
        }
    }

    /// One `Running` iteration: take at most one reading, then check timers.
    async fn step(&mut self) -> Result<WorkerState, HomelogError> {
        match self.receiver.try_take(self.config.poll_timeout).await {
            Ok(reading) => self.append(&reading).await?,
            Err(TakeError::Empty) => {
                tracing::trace!("ingest queue idle");
                if !self.lifecycle.is_running() {
                    return Ok(WorkerState::Draining);
                }
            }
            Err(TakeError::Closed) => {
                tracing::debug!("every producer is gone");
                return Ok(WorkerState::Draining);
            }
        }

        if self.last_commit.elapsed() >= self.config.commit_interval {
            self.store.flush().await?;
            self.last_commit = Instant::now();
            self.report.flushes += 1;
            tracing::debug!(appended = self.report.appended, "committed readings");
        }

        Ok(WorkerState::Running)
    }

    /// Refuse new readings, then persist every buffered one.
    async fn drain(&mut self) -> Result<(), HomelogError> {
        self.receiver.close();
        tracing::info!(pending = self.receiver.len(), "draining ingest queue");

        while let Some(reading) = self.receiver.next_buffered().await {
            self.append(&reading).await?;
            self.report.drained += 1;
        }
        Ok(())
    }

    async fn append(&mut self, reading: &Reading) -> Result<(), HomelogError> {
        self.store.append(reading).await?;
        self.report.appended += 1;
        Ok(())
    }
}
