//! # homelog-app
//!
//! Application layer: the persistence pipeline, event dispatch, and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ReadingStore`: append, flush, and close the durable reading log
//!   - `Notifier`: deliver an alert message to every configured recipient
//!   - `SwitchControl`: look up and drive a switch on the device network
//!   - `NetworkListener`: receive events from a device network
//! - Provide the **ingest pipeline**: a bounded multi-producer queue, the
//!   single persistence worker that drains it, and the lifecycle handle that
//!   stops it
//! - Provide **event dispatch**: an explicit registration table from event
//!   kind to handlers
//! - Provide **services** reacting to value updates (recording, alerts, motion)
//!
//! ## Dependency rule
//! Depends on `homelog-domain` only (plus `tokio` for channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod ingest;
pub mod lifecycle;
pub mod ports;
pub mod services;
pub mod worker;
