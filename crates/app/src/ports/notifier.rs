//! Notifier port: outbound alert delivery.

use std::future::Future;

/// Outcome of delivering one message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Recipient key the message was addressed to.
    pub recipient: String,
    /// Whether the transport accepted the message.
    pub delivered: bool,
    /// Transport-specific receipt, when one was returned.
    pub request_id: Option<String>,
    /// Failure description when `delivered` is `false`.
    pub error: Option<String>,
}

impl DeliveryResult {
    /// A successful delivery.
    #[must_use]
    pub fn delivered(recipient: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            recipient: recipient.into(),
            delivered: true,
            request_id,
            error: None,
        }
    }

    /// A failed delivery.
    #[must_use]
    pub fn failed(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            delivered: false,
            request_id: None,
            error: Some(error.into()),
        }
    }
}

/// Sends a short text message to every configured recipient.
///
/// Failures are reported per recipient in the returned list; a notifier never
/// fails as a whole.
pub trait Notifier {
    /// Deliver `message`, returning one result per recipient.
    fn notify(&self, message: &str) -> impl Future<Output = Vec<DeliveryResult>> + Send;
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn notify(&self, message: &str) -> impl Future<Output = Vec<DeliveryResult>> + Send {
        (**self).notify(message)
    }
}

/// `None` is a disabled notifier: nothing is sent, no result is returned.
impl<T: Notifier + Sync> Notifier for Option<T> {
    fn notify(&self, message: &str) -> impl Future<Output = Vec<DeliveryResult>> + Send {
        async move {
            match self {
                Some(inner) => inner.notify(message).await,
                None => Vec::new(),
            }
        }
    }
}
