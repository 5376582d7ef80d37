//! Daemon wiring and ordered shutdown.

use std::sync::Arc;

use tokio::runtime::Handle;

use homelog_adapter_pushover::PushoverNotifier;
use homelog_adapter_storage_sqlite_sqlx::Config as StorageConfig;
use homelog_adapter_virtual::{VirtualNetwork, VirtualSwitchBoard};
use homelog_app::dispatcher::{Dispatcher, log_network_events};
use homelog_app::ingest::{self, IngestSender, QueueClosed};
use homelog_app::lifecycle::{Lifecycle, WorkerHandle};
use homelog_app::ports::Notifier;
use homelog_app::services::alerter::Alerter;
use homelog_app::services::motion_light::MotionLight;
use homelog_app::services::threshold_alerts::ThresholdAlerts;
use homelog_app::services::value_recorder::ValueRecorder;
use homelog_app::worker::{PersistenceWorker, WorkerReport};
use homelog_domain::error::HomelogError;
use homelog_domain::event::{EventKind, NetworkEvent};

use crate::config::Config;

/// A running daemon: the persistence worker plus, when enabled, the virtual
/// network feeding it.
pub struct Daemon {
    worker: WorkerHandle,
    network: Option<VirtualNetwork>,
    dispatcher: Arc<Dispatcher>,
}

impl Daemon {
    /// Open storage, spawn the worker, and start the network.
    ///
    /// A Pushover setup failure is logged and notifications are disabled;
    /// it never prevents the daemon from starting.
    ///
    /// # Errors
    ///
    /// Returns [`HomelogError::StorageUnavailable`] if the database cannot be
    /// opened or written, or [`HomelogError::Network`] if the network fails to start.
    #[tracing::instrument(skip_all, fields(database = %config.database.url))]
    pub async fn start(config: &Config) -> Result<Self, HomelogError> {
        let store = StorageConfig {
            database_url: config.database.url.clone(),
        }
        .open()
        .await?;
        tracing::info!(
            location = store.location(),
            created_schema = store.created_schema(),
            "database opened"
        );

        let (sender, receiver) = ingest::bounded(config.queue.capacity);
        let worker = PersistenceWorker::new(
            store,
            receiver,
            Lifecycle::new(),
            config.worker_config(),
        );
        let mut worker = WorkerHandle::start(worker);

        let notifier = connect_notifier(config).await;
        let alerter = Alerter::new(notifier, Handle::current());
        let switches = VirtualNetwork::switch_board();
        let dispatcher = Arc::new(build_dispatcher(config, sender, switches.clone(), alerter));

        let network = match config.virtual_network_config() {
            Some(network_config) => {
                match VirtualNetwork::start(network_config, switches, Arc::clone(&dispatcher)) {
                    Ok(network) => Some(network),
                    Err(err) => {
                        worker.stop();
                        worker.finished().await;
                        return Err(err);
                    }
                }
            }
            None => {
                tracing::info!("virtual network disabled");
                None
            }
        };

        Ok(Self {
            worker,
            network,
            dispatcher,
        })
    }

    /// The dispatcher network events are routed through.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Wait until the persistence worker exits on its own. Cancel safe.
    pub async fn worker_finished(&mut self) {
        self.worker.finished().await;
    }

    /// Stop the network, then drain the queue and close the store.
    ///
    /// # Errors
    ///
    /// Returns the error the persistence worker stopped on.
    pub async fn shutdown(mut self) -> Result<WorkerReport, HomelogError> {
        if let Some(mut network) = self.network.take() {
            tokio::task::spawn_blocking(move || network.stop())
                .await
                .map_err(|err| HomelogError::Network(err.to_string()))?;
        }
        self.worker.stop();
        let report = self.worker.join().await?;
        tracing::info!(
            appended = report.appended,
            drained = report.drained,
            flushes = report.flushes,
            "persistence worker stopped"
        );
        Ok(report)
    }
}

async fn connect_notifier(config: &Config) -> Option<PushoverNotifier> {
    let pushover = config.pushover_config()?;
    match PushoverNotifier::connect(pushover).await {
        Ok(notifier) => {
            tracing::info!(users = notifier.users().len(), "pushover notifications enabled");
            Some(notifier)
        }
        Err(err) => {
            tracing::warn!(error = %err, "pushover unavailable, notifications disabled");
            None
        }
    }
}

fn build_dispatcher<N>(
    config: &Config,
    sender: IngestSender,
    switches: VirtualSwitchBoard,
    alerter: Alerter<N>,
) -> Dispatcher
where
    N: Notifier + Send + Sync + 'static,
{
    let recorder = ValueRecorder::new(sender);
    let alerts = ThresholdAlerts::new(config.threshold_rules(), alerter.clone());
    tracing::debug!(rules = alerts.rules().len(), "threshold alerts configured");
    let light = Arc::new(MotionLight::new(
        config.motion_light_config(),
        switches,
        alerter,
    ));

    let mut dispatcher = Dispatcher::new();
    log_network_events(&mut dispatcher);

    dispatcher.register(EventKind::ValueUpdated, {
        let light = Arc::clone(&light);
        move |event: &NetworkEvent| {
            let NetworkEvent::ValueUpdated(update) = event else {
                return;
            };
            if let Err(QueueClosed(reading)) = recorder.on_value(update) {
                tracing::warn!(
                    value_id = %reading.value_id,
                    "ingest queue closed, reading dropped"
                );
            }
            alerts.on_value(update);
            light.on_value(update);
        }
    });

    dispatcher.register_many(
        &[
            EventKind::NetworkStarted,
            EventKind::NodeUpdated,
            EventKind::NetworkReady,
        ],
        move |_| {
            light.locate();
        },
    );

    dispatcher
}
