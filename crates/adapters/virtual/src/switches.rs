//! Switch board shared between the emitter thread and switch consumers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use homelog_app::ports::{SwitchControl, SwitchInfo};
use homelog_domain::error::HomelogError;
use homelog_domain::id::ValueId;

#[derive(Debug)]
struct SwitchState {
    info: SwitchInfo,
    on: bool,
    unreported: bool,
}

/// Binary switches of the virtual network.
///
/// Clones share state: a position set through one handle is reported by the
/// emitter on its next tick.
#[derive(Debug, Clone, Default)]
pub struct VirtualSwitchBoard {
    inner: Arc<Mutex<BTreeMap<ValueId, SwitchState>>>,
}

impl VirtualSwitchBoard {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<ValueId, SwitchState>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a switch, initially off.
    pub fn install(&self, info: SwitchInfo) {
        self.lock().insert(
            info.value_id,
            SwitchState {
                info,
                on: false,
                unreported: false,
            },
        );
    }

    /// Current position of a switch.
    #[must_use]
    pub fn is_on(&self, value_id: ValueId) -> Option<bool> {
        self.lock().get(&value_id).map(|s| s.on)
    }

    /// Switches whose position changed since the last call.
    pub(crate) fn take_changes(&self) -> Vec<(SwitchInfo, bool)> {
        self.lock()
            .values_mut()
            .filter(|s| s.unreported)
            .map(|s| {
                s.unreported = false;
                (s.info.clone(), s.on)
            })
            .collect()
    }
}

impl SwitchControl for VirtualSwitchBoard {
    fn find_switch(&self, value_id: ValueId) -> Option<SwitchInfo> {
        self.lock().get(&value_id).map(|s| s.info.clone())
    }

    fn set_switch(&self, value_id: ValueId, on: bool) -> Result<(), HomelogError> {
        let mut switches = self.lock();
        let state = switches
            .get_mut(&value_id)
            .ok_or_else(|| HomelogError::Network(format!("no switch with value id {value_id}")))?;
        if state.on != on {
            state.on = on;
            state.unreported = true;
        }
        tracing::debug!(%value_id, on, "virtual switch set");
        Ok(())
    }
}
