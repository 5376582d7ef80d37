//! The simulated nodes and the values they report on each tick.

use homelog_app::ports::SwitchInfo;
use homelog_domain::event::{NetworkEvent, NodeInfo, ValueData, ValueUpdate};
use homelog_domain::id::{NodeId, ValueId};
use homelog_domain::time;

use crate::switches::VirtualSwitchBoard;

pub const MULTISENSOR: NodeId = NodeId::new(2);
pub const SMART_SWITCH: NodeId = NodeId::new(3);

pub const TEMPERATURE: ValueId = ValueId::new(0x0200_0031_0001);
pub const MOTION: ValueId = ValueId::new(0x0200_0030_0001);
pub const STATUS: ValueId = ValueId::new(0x0200_0070_0001);
/// The smart switch's on/off value.
pub const LIGHT: ValueId = ValueId::new(0x0300_0025_0001);

/// Motion toggles every this many ticks.
const MOTION_PERIOD: u32 = 5;

pub(crate) fn multisensor() -> NodeInfo {
    NodeInfo {
        node_id: MULTISENSOR,
        product_name: "Multisensor".to_string(),
        product_type: "0x0002".to_string(),
    }
}

pub(crate) fn smart_switch() -> NodeInfo {
    NodeInfo {
        node_id: SMART_SWITCH,
        product_name: "Smart Switch".to_string(),
        product_type: "0x0003".to_string(),
    }
}

pub(crate) fn install_switches(board: &VirtualSwitchBoard) {
    board.install(SwitchInfo {
        node_id: SMART_SWITCH,
        value_id: LIGHT,
        label: "Switch".to_string(),
    });
}

fn update(
    node: NodeInfo,
    value_id: ValueId,
    label: &str,
    data: ValueData,
    units: &str,
) -> NetworkEvent {
    NetworkEvent::ValueUpdated(ValueUpdate {
        node,
        value_id,
        label: label.to_string(),
        data,
        units: units.to_string(),
        timestamp: time::now(),
    })
}

/// Deterministic value generator.
#[derive(Debug, Default)]
pub(crate) struct Simulation {
    tick: u32,
}

impl Simulation {
    /// Events announcing the network and its nodes.
    pub(crate) fn startup() -> Vec<NetworkEvent> {
        vec![
            NetworkEvent::NetworkStarted,
            NetworkEvent::NodeUpdated {
                node: multisensor(),
            },
            NetworkEvent::NodeUpdated {
                node: smart_switch(),
            },
            NetworkEvent::NetworkReady,
        ]
    }

    /// Values reported on the next tick.
    pub(crate) fn next(&mut self, switches: &VirtualSwitchBoard) -> Vec<NetworkEvent> {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let temperature = 20.0 + f64::from(tick % 10) / 10.0;
        let motion = if (tick / MOTION_PERIOD) % 2 == 1 { 8 } else { 0 };

        let mut events = vec![
            update(
                multisensor(),
                TEMPERATURE,
                "Temperature",
                ValueData::Float(temperature),
                "C",
            ),
            update(
                multisensor(),
                MOTION,
                "Burglar",
                ValueData::Int(motion),
                "",
            ),
            update(
                multisensor(),
                STATUS,
                "Status",
                ValueData::Text("Ready".to_string()),
                "",
            ),
        ];
        events.extend(switches.take_changes().into_iter().map(|(info, on)| {
            update(smart_switch(), info.value_id, &info.label, ValueData::Bool(on), "")
        }));
        events
    }
}
