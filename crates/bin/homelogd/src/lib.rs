//! # homelogd
//!
//! Composition root that wires the device network, the ingest pipeline, and
//! the adapters together.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Open the `SQLite` reading store and spawn the persistence worker
//! - Build the event dispatcher: logging, value recording, threshold alerts,
//!   motion light
//! - Start the device network and route its events through the dispatcher
//! - Shut down in order: network first, then drain and close the store
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod config;
pub mod daemon;
