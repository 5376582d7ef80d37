//! Value recorder: turns numeric value updates into queued readings.

use homelog_domain::event::ValueUpdate;

use crate::ingest::{IngestSender, QueueClosed};

/// Enqueues a [`Reading`](homelog_domain::reading::Reading) for every
/// numeric value update.
///
/// Runs on network callback threads: enqueueing blocks while the ingest
/// queue is full rather than dropping the reading.
#[derive(Debug, Clone)]
pub struct ValueRecorder {
    sender: IngestSender,
}

impl ValueRecorder {
    #[must_use]
    pub fn new(sender: IngestSender) -> Self {
        Self { sender }
    }

    /// Log the update and enqueue it when numeric.
    ///
    /// Returns `true` when a reading was enqueued.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] when the persistence worker is draining or gone.
    pub fn on_value(&self, update: &ValueUpdate) -> Result<bool, QueueClosed> {
        tracing::info!(
            node_id = %update.node.node_id,
            value_id = %update.value_id,
            name = update.node.display_name(),
            label = %update.label,
            value = %update.data,
            units = %update.units,
            "value updated"
        );

        match update.reading() {
            Some(reading) => {
                self.sender.put_blocking(reading)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use homelog_domain::event::{NodeInfo, ValueData};
    use homelog_domain::id::{NodeId, ValueId};
    use std::time::Duration;

    fn update(data: ValueData) -> ValueUpdate {
        ValueUpdate {
            node: NodeInfo {
                node_id: NodeId::new(2),
                product_name: "Multisensor".to_string(),
                product_type: String::new(),
            },
            value_id: ValueId::new(0x48),
            label: "Temperature".to_string(),
            data,
            units: "C".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn should_enqueue_numeric_values() {
        let (tx, mut rx) = ingest::bounded(4);
        let recorder = ValueRecorder::new(tx);
        let update = update(ValueData::Float(21.5));

        assert!(recorder.on_value(&update).unwrap());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let reading = runtime
            .block_on(rx.try_take(Duration::from_millis(10)))
            .unwrap();
        assert_eq!(reading.value_id, ValueId::new(0x48));
        assert_eq!(reading.timestamp, update.timestamp);
        assert!((reading.value - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_ignore_text_values() {
        let (tx, rx) = ingest::bounded(4);
        let recorder = ValueRecorder::new(tx);

        let enqueued = recorder
            .on_value(&update(ValueData::Text("Ready".to_string())))
            .unwrap();

        assert!(!enqueued);
        assert!(rx.is_empty());
    }

    #[test]
    fn should_report_closed_queue() {
        let (tx, mut rx) = ingest::bounded(4);
        rx.close();
        let recorder = ValueRecorder::new(tx);

        let result = recorder.on_value(&update(ValueData::Int(3)));

        assert!(result.is_err());
    }
}
