//! Motion light: switch a light on while a motion sensor reports movement.

use std::sync::{Mutex, OnceLock};

use homelog_domain::event::ValueUpdate;
use homelog_domain::id::ValueId;

use crate::ports::{Notifier, SwitchControl, SwitchInfo};
use crate::services::alerter::Alerter;

/// Sensor value reported by burglar-alarm command classes on movement.
pub const MOTION_DETECTED: f64 = 8.0;

/// Which light to drive, and whether to drive it at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionLightConfig {
    /// Value id of the light's switch.
    pub light: Option<ValueId>,
    /// Switch the light with motion reports. When `false`, motion is only logged.
    pub follow_motion: bool,
}

/// Logs motion reports and, when enabled, makes a light follow them.
pub struct MotionLight<N, W> {
    config: MotionLightConfig,
    switches: W,
    alerter: Alerter<N>,
    light: OnceLock<SwitchInfo>,
    last_state: Mutex<Option<bool>>,
}

/// Motion reports are the values whose label starts with "burglar".
#[must_use]
pub fn is_motion_report(update: &ValueUpdate) -> bool {
    update.label.to_lowercase().starts_with("burglar")
}

impl<N, W> MotionLight<N, W>
where
    N: Notifier + Send + Sync + 'static,
    W: SwitchControl,
{
    pub fn new(config: MotionLightConfig, switches: W, alerter: Alerter<N>) -> Self {
        Self {
            config,
            switches,
            alerter,
            light: OnceLock::new(),
            last_state: Mutex::new(None),
        }
    }

    /// Look the configured light up on the network. The first hit is kept.
    pub fn locate(&self) -> Option<&SwitchInfo> {
        if let Some(light) = self.light.get() {
            return Some(light);
        }
        let value_id = self.config.light?;
        if let Some(found) = self.switches.find_switch(value_id) {
            tracing::info!(
                %value_id,
                node_id = %found.node_id,
                label = %found.label,
                "found light"
            );
            Some(self.light.get_or_init(|| found))
        } else {
            tracing::info!(%value_id, "did not find light switch");
            None
        }
    }

    /// Handle a value update. Returns the state the light was switched to,
    /// if it was switched.
    pub fn on_value(&self, update: &ValueUpdate) -> Option<bool> {
        if !is_motion_report(update) {
            return None;
        }
        tracing::info!(value = %update.data, "detected movement");

        if !self.config.follow_motion {
            return None;
        }
        let light = self.light.get()?;
        let on = update
            .data
            .as_number()
            .is_some_and(|value| (value - MOTION_DETECTED).abs() < f64::EPSILON);

        {
            let mut last = self
                .last_state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if *last == Some(on) {
                return None;
            }
            *last = Some(on);
        }

        let message = format!("Turning light {}", if on { "on" } else { "off" });
        tracing::info!(value_id = %light.value_id, "{message}");
        self.alerter.send(message);

        if let Err(err) = self.switches.set_switch(light.value_id, on) {
            tracing::warn!(error = %err, value_id = %light.value_id, "failed to switch light");
        }
        Some(on)
    }
}
