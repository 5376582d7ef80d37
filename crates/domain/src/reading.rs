//! Reading: one timestamped numeric value captured from a monitored entity.

use serde::{Deserialize, Serialize};

use crate::id::ValueId;
use crate::time::{Timestamp, now, truncate};

/// An immutable numeric measurement.
///
/// Produced when a device reports a numeric value and consumed exactly once
/// by the persistence worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: Timestamp,
    pub value_id: ValueId,
    pub value: f64,
}

impl Reading {
    /// Create a reading captured at `timestamp`, kept to microsecond
    /// precision so it reads back from storage unchanged.
    #[must_use]
    pub fn new(timestamp: Timestamp, value_id: ValueId, value: f64) -> Self {
        Self {
            timestamp: truncate(timestamp),
            value_id,
            value,
        }
    }

    /// Create a reading stamped with the current time.
    #[must_use]
    pub fn now(value_id: ValueId, value: f64) -> Self {
        Self::new(now(), value_id, value)
    }
}
