//! # homelog-adapter-virtual
//!
//! Simulated device network for running homelog without hardware.
//!
//! ## Provided nodes
//!
//! | Node | Values |
//! |------|--------|
//! | 2 `Multisensor` | temperature (float), `Burglar` motion report (int, `8` on movement), status (text) |
//! | 3 `Smart Switch` | on/off switch ([`LIGHT`]) |
//!
//! Events are emitted from a dedicated OS thread, the way a native network
//! driver calls back into the application.
//!
//! ## Dependency rule
//!
//! Depends on `homelog-app` (port traits) and `homelog-domain` only.

mod nodes;
mod switches;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use homelog_app::ports::NetworkListener;
use homelog_domain::error::HomelogError;

pub use nodes::{LIGHT, MOTION, MULTISENSOR, SMART_SWITCH, STATUS, TEMPERATURE};
pub use switches::VirtualSwitchBoard;

use nodes::Simulation;

/// Tick settings for the virtual network.
#[derive(Debug, Clone, Copy)]
pub struct VirtualNetworkConfig {
    /// Time between two rounds of value reports.
    pub interval: Duration,
}

impl Default for VirtualNetworkConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// A running virtual network.
///
/// Dropping it stops the emitter thread.
pub struct VirtualNetwork {
    switches: VirtualSwitchBoard,
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl VirtualNetwork {
    /// Switch board holding the virtual nodes' switches, all off.
    #[must_use]
    pub fn switch_board() -> VirtualSwitchBoard {
        let switches = VirtualSwitchBoard::default();
        nodes::install_switches(&switches);
        switches
    }

    /// Start emitting events to `listener`, reporting the switches of
    /// `switches` (usually built by [`switch_board`](Self::switch_board)).
    ///
    /// # Errors
    ///
    /// Returns [`HomelogError::Network`] if the emitter thread cannot be spawned.
    pub fn start<L>(
        config: VirtualNetworkConfig,
        switches: VirtualSwitchBoard,
        listener: L,
    ) -> Result<Self, HomelogError>
    where
        L: NetworkListener + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let board = switches.clone();
        let thread = std::thread::Builder::new()
            .name("virtual-network".to_string())
            .spawn(move || emit(&config, &listener, &board, &stopped))
            .map_err(|err| HomelogError::Network(err.to_string()))?;

        tracing::info!(interval = ?config.interval, "virtual network started");
        Ok(Self {
            switches,
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    /// Handle on the network's switches.
    #[must_use]
    pub fn switches(&self) -> VirtualSwitchBoard {
        self.switches.clone()
    }

    /// Stop emitting and wait for the emitter thread. No event is delivered
    /// once this returns. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the emitter.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("virtual network thread panicked");
            } else {
                tracing::info!("virtual network stopped");
            }
        }
    }
}

impl Drop for VirtualNetwork {
    fn drop(&mut self) {
        self.stop();
    }
}

fn emit<L: NetworkListener>(
    config: &VirtualNetworkConfig,
    listener: &L,
    switches: &VirtualSwitchBoard,
    stopped: &mpsc::Receiver<()>,
) {
    for event in Simulation::startup() {
        listener.on_event(&event);
    }

    let mut simulation = Simulation::default();
    loop {
        match stopped.recv_timeout(config.interval) {
            Err(RecvTimeoutError::Timeout) => {
                for event in simulation.next(switches) {
                    listener.on_event(&event);
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
