//! Network port: the callback surface a device network drives.

use homelog_domain::event::NetworkEvent;

/// Receives events from a device network.
///
/// Implementations are invoked from whatever thread the network driver uses,
/// possibly several concurrently, and must not assume an async context.
pub trait NetworkListener: Send + Sync {
    fn on_event(&self, event: &NetworkEvent);
}

impl<T: NetworkListener + ?Sized> NetworkListener for std::sync::Arc<T> {
    fn on_event(&self, event: &NetworkEvent) {
        (**self).on_event(event);
    }
}
