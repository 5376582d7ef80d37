//! Lifecycle: cooperative shutdown of the persistence worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use homelog_domain::error::HomelogError;

use crate::ports::ReadingStore;
use crate::worker::{PersistenceWorker, WorkerReport};

/// Shared `running` flag, handed to the worker and to whoever may stop it.
///
/// Clones share the same flag. The flag starts `true` and flips to `false`
/// exactly once.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    running: Arc<AtomicBool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Never blocks; safe to call from any thread, any
    /// number of times.
    ///
    /// Returns `true` for the call that actually flipped the flag.
    pub fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            tracing::info!("shutdown requested");
        }
        was_running
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

type WorkerOutcome = Result<WorkerReport, HomelogError>;

/// Handle on a spawned persistence worker.
pub struct WorkerHandle {
    lifecycle: Lifecycle,
    task: JoinHandle<WorkerOutcome>,
    outcome: Option<WorkerOutcome>,
}

impl WorkerHandle {
    /// Spawn `worker` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    #[must_use]
    pub fn start<S>(worker: PersistenceWorker<S>) -> Self
    where
        S: ReadingStore + 'static,
    {
        let lifecycle = worker.lifecycle().clone();
        let task = tokio::spawn(worker.run());
        Self {
            lifecycle,
            task,
            outcome: None,
        }
    }

    /// Request the worker to drain and stop. Does not wait.
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    /// The flag this worker observes.
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Wait until the worker exits on its own, without consuming the handle.
    ///
    /// Cancel safe: dropping the future before completion loses nothing.
    pub async fn finished(&mut self) {
        if self.outcome.is_none() {
            let joined = (&mut self.task).await;
            self.outcome = Some(joined.unwrap_or_else(|err| {
                tracing::error!(error = %err, "persistence worker task failed");
                Err(HomelogError::WorkerCrashed)
            }));
        }
    }

    /// Wait for the worker to reach its terminal state and return its result.
    ///
    /// Call [`stop`](Self::stop) first, or this waits until every producer
    /// is gone.
    ///
    /// # Errors
    ///
    /// Returns the error the worker stopped on, or
    /// [`HomelogError::WorkerCrashed`] if the task panicked.
    pub async fn join(mut self) -> WorkerOutcome {
        self.finished().await;
        self.outcome.take().unwrap_or(Err(HomelogError::WorkerCrashed))
    }
}
