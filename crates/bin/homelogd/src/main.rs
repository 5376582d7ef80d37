//! homelogd entry point: load config, init logging, run until a shutdown
//! signal or until the persistence worker stops.

use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use homelog_domain::error::HomelogError;
use homelogd::config::Config;
use homelogd::daemon::Daemon;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("homelogd: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.filter);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(exit_status(&err)),
    }
}

/// `2` when the data pipeline broke and readings may be lost, `1` otherwise.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<HomelogError>() {
        Some(cause) if cause.is_fatal() => {
            tracing::error!("homelogd storage failure: {err:#}");
            2
        }
        _ => {
            tracing::error!("homelogd failed: {err:#}");
            1
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("homelogd: invalid log filter {filter:?}: {err}");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let mut daemon = Daemon::start(config)
        .await
        .context("failed to start homelogd")?;

    tokio::select! {
        () = shutdown_signal() => tracing::info!("shutdown signal received"),
        () = daemon.worker_finished() => tracing::warn!("persistence worker exited"),
    }

    daemon
        .shutdown()
        .await
        .context("persistence worker failed")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_exit_with_two_on_storage_failure() {
        let err =
            anyhow::Error::new(HomelogError::StorageClosed).context("persistence worker failed");
        assert_eq!(exit_status(&err), 2);
    }

    #[test]
    fn should_exit_with_one_on_other_failures() {
        let network = anyhow::Error::new(HomelogError::Network("gone".to_string()))
            .context("failed to start homelogd");
        assert_eq!(exit_status(&network), 1);

        let unrelated = anyhow::anyhow!("config vanished");
        assert_eq!(exit_status(&unrelated), 1);
    }
}
