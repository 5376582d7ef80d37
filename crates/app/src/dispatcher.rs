//! Event dispatcher: explicit registration table from [`EventKind`] to handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use homelog_domain::event::{EventKind, NetworkEvent};

use crate::ports::NetworkListener;

/// A registered event handler.
pub type Handler = Arc<dyn Fn(&NetworkEvent) + Send + Sync>;

/// Routes each [`NetworkEvent`] to the handlers registered for its kind.
///
/// Handlers run synchronously on the thread that delivered the event, in
/// registration order. Build the table once at startup, then share it
/// behind an `Arc`.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn register<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&NetworkEvent) + Send + Sync + 'static,
    {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
        self
    }

    /// Register the same handler for several kinds.
    pub fn register_many<F>(&mut self, kinds: &[EventKind], handler: F) -> &mut Self
    where
        F: Fn(&NetworkEvent) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        for kind in kinds {
            self.handlers
                .entry(*kind)
                .or_default()
                .push(Arc::clone(&handler));
        }
        self
    }

    /// Number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's kind.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&self, event: &NetworkEvent) -> usize {
        let kind = event.kind();
        let Some(handlers) = self.handlers.get(&kind) else {
            tracing::debug!(%kind, "no handler registered");
            return 0;
        };
        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl NetworkListener for Dispatcher {
    fn on_event(&self, event: &NetworkEvent) {
        self.dispatch(event);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            let count = self.handler_count(kind);
            if count > 0 {
                map.entry(&kind, &count);
            }
        }
        map.finish()
    }
}

/// Log every network-level event at `info`.
///
/// Value updates are logged by the value recorder instead.
pub fn log_network_events(dispatcher: &mut Dispatcher) -> &mut Dispatcher {
    dispatcher.register_many(
        &[
            EventKind::NodeUpdated,
            EventKind::NetworkStarted,
            EventKind::NetworkFailed,
            EventKind::NetworkReady,
            EventKind::Notification,
        ],
        |event| match event {
            NetworkEvent::NodeUpdated { node } => tracing::info!(
                node_id = %node.node_id,
                name = node.display_name(),
                "node updated"
            ),
            NetworkEvent::NetworkStarted => tracing::info!("network started"),
            NetworkEvent::NetworkFailed => tracing::warn!("network failed"),
            NetworkEvent::NetworkReady => tracing::info!("network ready"),
            NetworkEvent::Notification { node_id, code } => {
                tracing::info!(%node_id, code, "node notification");
            }
            NetworkEvent::ValueUpdated(_) => {}
        },
    )
}
