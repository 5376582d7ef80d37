//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod network;
pub mod notifier;
pub mod reading_store;
pub mod switch;

pub use network::NetworkListener;
pub use notifier::{DeliveryResult, Notifier};
pub use reading_store::ReadingStore;
pub use switch::{SwitchControl, SwitchInfo};
