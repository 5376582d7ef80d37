//! Switch port: binary switches exposed by the device network.

use homelog_domain::error::HomelogError;
use homelog_domain::id::{NodeId, ValueId};

/// A switch found on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    pub node_id: NodeId,
    pub value_id: ValueId,
    pub label: String,
}

/// Looks up and drives switches.
///
/// Calls are synchronous: they are made from network callback threads.
pub trait SwitchControl: Send + Sync {
    /// Find the switch exposing `value_id`, if any node has it.
    fn find_switch(&self, value_id: ValueId) -> Option<SwitchInfo>;

    /// Request the switch to turn on or off.
    ///
    /// # Errors
    ///
    /// Returns [`HomelogError::Network`] if the network rejects the request.
    fn set_switch(&self, value_id: ValueId, on: bool) -> Result<(), HomelogError>;
}
