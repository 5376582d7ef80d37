//! Network events: the closed set of notifications a device network emits.
//!
//! Adapters translate whatever their protocol stack produces into a
//! [`NetworkEvent`]; the application dispatches on [`EventKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{NodeId, ValueId};
use crate::reading::Reading;
use crate::time::Timestamp;

/// Identity and product description of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: NodeId,
    pub product_name: String,
    pub product_type: String,
}

impl NodeInfo {
    /// Human readable name: the product name, or the product type when the
    /// node does not report one.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.product_name.is_empty() {
            &self.product_type
        } else {
            &self.product_name
        }
    }
}

/// Payload of a value as reported by the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ValueData {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl ValueData {
    /// Numeric view of the payload, `None` for text.
    ///
    /// Booleans count as numbers (`1.0` / `0.0`) so switch positions are
    /// recorded alongside sensor readings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }

    /// Whether the payload is persisted as a reading.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => v.fmt(f),
            Self::Int(v) => v.fmt(f),
            Self::Bool(v) => v.fmt(f),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// A node reported a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueUpdate {
    pub node: NodeInfo,
    pub value_id: ValueId,
    pub label: String,
    pub data: ValueData,
    pub units: String,
    pub timestamp: Timestamp,
}

impl ValueUpdate {
    /// The reading to persist, when the value is numeric.
    #[must_use]
    pub fn reading(&self) -> Option<Reading> {
        self.data
            .as_number()
            .map(|value| Reading::new(self.timestamp, self.value_id, value))
    }
}

/// Everything the device network can tell us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// A node was added or its description changed.
    NodeUpdated { node: NodeInfo },
    /// A node reported a new value.
    ValueUpdated(ValueUpdate),
    /// The network driver started.
    NetworkStarted,
    /// The network driver failed to start.
    NetworkFailed,
    /// All nodes were queried and the network is usable.
    NetworkReady,
    /// A node sent a protocol-level notification.
    Notification { node_id: NodeId, code: u8 },
}

/// Discriminant of a [`NetworkEvent`], used as a dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NodeUpdated,
    ValueUpdated,
    NetworkStarted,
    NetworkFailed,
    NetworkReady,
    Notification,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::NodeUpdated,
        Self::ValueUpdated,
        Self::NetworkStarted,
        Self::NetworkFailed,
        Self::NetworkReady,
        Self::Notification,
    ];

    /// Return the `snake_case` name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NodeUpdated => "node_updated",
            Self::ValueUpdated => "value_updated",
            Self::NetworkStarted => "network_started",
            Self::NetworkFailed => "network_failed",
            Self::NetworkReady => "network_ready",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NetworkEvent {
    /// The dispatch key of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NodeUpdated { .. } => EventKind::NodeUpdated,
            Self::ValueUpdated(_) => EventKind::ValueUpdated,
            Self::NetworkStarted => EventKind::NetworkStarted,
            Self::NetworkFailed => EventKind::NetworkFailed,
            Self::NetworkReady => EventKind::NetworkReady,
            Self::Notification { .. } => EventKind::Notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn node(name: &str) -> NodeInfo {
        NodeInfo {
            node_id: NodeId::new(2),
            product_name: name.to_string(),
            product_type: "0x0002".to_string(),
        }
    }

    fn update(data: ValueData) -> ValueUpdate {
        ValueUpdate {
            node: node("Multisensor"),
            value_id: ValueId::new(5),
            label: "Temperature".to_string(),
            data,
            units: "C".to_string(),
            timestamp: now(),
        }
    }

    #[test]
    fn should_fall_back_to_product_type_when_name_empty() {
        assert_eq!(node("").display_name(), "0x0002");
        assert_eq!(node("Multisensor").display_name(), "Multisensor");
    }

    #[test]
    fn should_produce_reading_for_float_value() {
        let update = update(ValueData::Float(21.5));
        let reading = update.reading().unwrap();
        assert_eq!(reading.value_id, ValueId::new(5));
        assert_eq!(reading.timestamp, update.timestamp);
        assert!((reading.value - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_produce_reading_for_integer_and_bool_values() {
        assert_eq!(update(ValueData::Int(8)).reading().unwrap().value, 8.0);
        assert_eq!(update(ValueData::Bool(true)).reading().unwrap().value, 1.0);
    }

    #[test]
    fn should_not_produce_reading_for_text_value() {
        let update = update(ValueData::Text("Ready".to_string()));
        assert!(!update.data.is_numeric());
        assert!(update.reading().is_none());
    }

    #[test]
    fn should_map_every_event_to_its_kind() {
        assert_eq!(NetworkEvent::NetworkReady.kind(), EventKind::NetworkReady);
        assert_eq!(
            NetworkEvent::ValueUpdated(update(ValueData::Int(1))).kind(),
            EventKind::ValueUpdated
        );
        assert_eq!(
            NetworkEvent::Notification {
                node_id: NodeId::new(3),
                code: 2
            }
            .kind(),
            EventKind::Notification
        );
    }

    #[test]
    fn should_list_all_kinds_once() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "node_updated",
                "value_updated",
                "network_started",
                "network_failed",
                "network_ready",
                "notification"
            ]
        );
    }

    #[test]
    fn should_serialize_event_with_kind_tag() {
        let json = serde_json::to_value(NetworkEvent::NetworkStarted).unwrap();
        assert_eq!(json["kind"], "network_started");
    }
}
