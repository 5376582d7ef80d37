//! Alerter: fire-and-forget delivery of alert messages.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::ports::Notifier;

/// Sends alert messages through a [`Notifier`] without blocking the caller.
///
/// Delivery runs as a task on the given runtime, so network callback threads
/// and the persistence pipeline never wait on the notification transport.
pub struct Alerter<N> {
    notifier: Arc<N>,
    runtime: Handle,
}

impl<N> Clone for Alerter<N> {
    fn clone(&self) -> Self {
        Self {
            notifier: Arc::clone(&self.notifier),
            runtime: self.runtime.clone(),
        }
    }
}

impl<N> Alerter<N>
where
    N: Notifier + Send + Sync + 'static,
{
    /// Create an alerter spawning deliveries on `runtime`.
    pub fn new(notifier: N, runtime: Handle) -> Self {
        Self {
            notifier: Arc::new(notifier),
            runtime,
        }
    }

    /// Queue `message` for delivery and return immediately.
    ///
    /// Delivery failures are logged, never propagated.
    pub fn send(&self, message: impl Into<String>) -> JoinHandle<()> {
        let message = message.into();
        let notifier = Arc::clone(&self.notifier);
        self.runtime.spawn(async move {
            let results = notifier.notify(&message).await;
            let delivered = results.iter().filter(|r| r.delivered).count();
            for failed in results.iter().filter(|r| !r.delivered) {
                tracing::warn!(
                    recipient = %failed.recipient,
                    error = failed.error.as_deref().unwrap_or("unknown"),
                    "alert delivery failed"
                );
            }
            tracing::info!(
                %message,
                delivered,
                recipients = results.len(),
                "alert sent"
            );
        })
    }
}
