//! # homelog-domain
//!
//! Pure domain model for the homelog event logger.
//!
//! ## Responsibilities
//! - Foundational types: integer identifiers, error conventions, timestamps
//! - Define **Readings** (timestamped numeric values captured from a monitored entity)
//! - Define **Network events** (the closed set of notifications a device network emits)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod reading;
