//! # homelog-adapter-pushover
//!
//! Delivers alert messages through the [Pushover](https://pushover.net)
//! HTTP API.
//!
//! ## Dependency rule
//!
//! Depends on `homelog-app` (port traits) and `homelog-domain` only.

mod error;
mod notifier;

pub use error::PushoverError;
pub use notifier::{DEFAULT_API_URL, PushoverConfig, PushoverNotifier};
