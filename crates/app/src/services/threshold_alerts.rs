//! Threshold alerts: notify when a value enters an alerting range.

use std::sync::Mutex;

use tokio::task::JoinHandle;

use homelog_domain::event::ValueUpdate;
use homelog_domain::id::ValueId;

use crate::ports::Notifier;
use crate::services::alerter::Alerter;

/// Alert when `value_id` goes above `above` or below `below`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub value_id: ValueId,
    pub above: Option<f64>,
    pub below: Option<f64>,
    pub message: String,
}

impl ThresholdRule {
    /// Whether `value` lies in the alerting range.
    #[must_use]
    pub fn is_alerting(&self, value: f64) -> bool {
        self.above.is_some_and(|limit| value > limit)
            || self.below.is_some_and(|limit| value < limit)
    }
}

/// Edge-triggered evaluation of [`ThresholdRule`]s.
///
/// A rule fires once when its value enters the alerting range and re-arms
/// when the value leaves it.
pub struct ThresholdAlerts<N> {
    rules: Vec<ThresholdRule>,
    alerting: Mutex<Vec<bool>>,
    alerter: Alerter<N>,
}

impl<N> ThresholdAlerts<N>
where
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(rules: Vec<ThresholdRule>, alerter: Alerter<N>) -> Self {
        let alerting = Mutex::new(vec![false; rules.len()]);
        Self {
            rules,
            alerting,
            alerter,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Evaluate every rule watching this value and send the alerts that fire.
    ///
    /// Returns the spawned deliveries; callers may ignore them.
    pub fn on_value(&self, update: &ValueUpdate) -> Vec<JoinHandle<()>> {
        let Some(value) = update.data.as_number() else {
            return Vec::new();
        };

        let mut fired = Vec::new();
        {
            let mut alerting = self
                .alerting
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for (rule, state) in self.rules.iter().zip(alerting.iter_mut()) {
                if rule.value_id != update.value_id {
                    continue;
                }
                let now_alerting = rule.is_alerting(value);
                if now_alerting && !*state {
                    tracing::info!(value_id = %rule.value_id, value, "threshold crossed");
                    fired.push(rule.message.clone());
                }
                *state = now_alerting;
            }
        }

        fired
            .into_iter()
            .map(|message| self.alerter.send(message))
            .collect()
    }
}
