//! Bridge engine with statum state machine for the evaluation loop
//!
//! Runs the binding evaluator at a fixed cycle rate inside a tokio task,
//! with compile-time state safety over the lifecycle.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Configured ──► Active ──► Deactivating ──► Deactivated
//!                     │              │           ▲
//!                     └──────────────┘           │
//!                       (activate/deactivate)    │
//!                                              (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! InputSnapshot ──► [BindingEngine::tick] ──► Vec<OutputCommand>
//!       ▲                                           │
//!       │                                           ▼
//!  Snapshot Channel                           Command Channel
//! ```
//!
//! Each cycle re-uses the most recent snapshot when no fresh one arrived,
//! so armed pulses still release on time while the hardware is quiet. The
//! evaluation pass always runs against one atomic snapshot; a torn
//! snapshot cannot be observed.

use crate::engine::{BindingEngine, Binding, InputSnapshot, MappingError, OutputCommand};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// States for the bridge lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum BridgeState {
    Initializing, // Setting up bridge structure
    Configured,   // Bindings loaded and validated
    Active,       // Evaluating cycles in main loop
    Deactivating, // Shutting down gracefully
    Deactivated,  // Fully stopped, outputs released
}

/// Bridge engine with compile-time state safety via statum
///
/// Wraps the binding evaluator and manages its lifecycle through distinct
/// states. Each state has specific allowed operations enforced at compile
/// time.
#[machine]
pub struct BridgeEngine<S: BridgeState> {
    snapshot_receiver: mpsc::Receiver<InputSnapshot>,
    command_sender: mpsc::Sender<Vec<OutputCommand>>,
    name: String,
    engine: Option<BindingEngine>,
    cycle_period: Duration,
    last_snapshot: InputSnapshot,
}

impl<S: BridgeState> BridgeEngine<S> {
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl BridgeEngine<Initializing> {
    pub fn create(
        snapshot_receiver: mpsc::Receiver<InputSnapshot>,
        command_sender: mpsc::Sender<Vec<OutputCommand>>,
        name: String,
        cycle_period: Duration,
    ) -> Self {
        info!("Initializing new bridge engine: {}", name);

        Self::new(
            snapshot_receiver,
            command_sender,
            name,
            None, // engine
            cycle_period,
            InputSnapshot::empty(),
        )
    }

    /// Configures the bridge with a binding set and transitions to
    /// Configured.
    pub fn configure(
        mut self,
        bindings: Vec<Binding>,
    ) -> Result<BridgeEngine<Configured>, MappingError> {
        info!(
            "Configuring bridge engine `{}` with {} bindings",
            self.name,
            bindings.len()
        );

        if bindings.is_empty() {
            warn!("Bridge `{}` configured without bindings", self.name);
        }

        self.engine = Some(BindingEngine::new(bindings, self.cycle_period));
        Ok(self.transition())
    }
}

impl BridgeEngine<Configured> {
    pub fn activate(self) -> BridgeEngine<Active> {
        info!("Activating bridge engine: {}", self.name);
        self.transition()
    }
}

impl BridgeEngine<Active> {
    /// Runs one evaluation cycle.
    ///
    /// Drains the snapshot channel keeping only the latest reading, then
    /// ticks the evaluator. Returns None when the cycle produced no
    /// commands.
    pub fn process_cycle(&mut self) -> Result<Option<Vec<OutputCommand>>, MappingError> {
        while let Ok(snapshot) = self.snapshot_receiver.try_recv() {
            self.last_snapshot = snapshot;
        }

        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| MappingError::ConfigError("no binding engine configured".into()))?;

        let commands = engine.tick(&self.last_snapshot);
        if commands.is_empty() {
            Ok(None)
        } else {
            Ok(Some(commands))
        }
    }

    /// Sends one cycle's commands to the dispatcher channel.
    pub fn send_commands(&self, commands: Vec<OutputCommand>) -> Result<(), MappingError> {
        match self.command_sender.try_send(commands) {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to send commands: {}", e);
                Err(MappingError::ChannelError(format!(
                    "Failed to send commands: {}",
                    e
                )))
            }
        }
    }

    /// Main evaluation loop with graceful shutdown support
    ///
    /// Runs until the shutdown signal is received, one cycle per period.
    /// Individual cycle errors do not stop the loop.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<BridgeEngine<Deactivating>, MappingError> {
        info!("Starting evaluation loop for: {}", self.name);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for: {}", self.name);
                    break;
                }

                _ = tokio::time::sleep(self.cycle_period) => {
                    match self.process_cycle() {
                        Ok(Some(commands)) => {
                            debug!("Cycle produced {} commands", commands.len());
                            if let Err(e) = self.send_commands(commands) {
                                warn!("Failed to send commands: {}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!("Error processing cycle: {}", e);
                        }
                    }
                }
            }
        }

        info!("Transitioning to Deactivating state: {}", self.name);
        Ok(self.transition())
    }

    pub fn deactivate(self) -> BridgeEngine<Deactivating> {
        info!("Deactivating bridge engine: {}", self.name);
        self.transition()
    }
}

impl BridgeEngine<Deactivating> {
    /// Runs the release-all pass and transitions to Deactivated.
    ///
    /// Every binding whose last known output state is ON emits an OFF, so
    /// no key, button or LED stays latched after the bridge stops. Always
    /// attempted, even when prior cycles errored.
    pub async fn shutdown(mut self) -> BridgeEngine<Deactivated> {
        info!("Shutting down bridge engine: {}", self.name);

        if let Some(engine) = &mut self.engine {
            let released = engine.shutdown();
            if !released.is_empty() {
                info!("Releasing {} latched outputs", released.len());
                if let Err(e) = self.command_sender.send(released).await {
                    warn!("Release-all commands not delivered: {}", e);
                }
            }
        }

        info!("Bridge shut down successfully: {}", self.name);
        self.transition()
    }
}

impl BridgeEngine<Deactivated> {}

/// Handle for managing a bridge engine in a tokio task
///
/// Provides lifecycle management for a bridge running in the background.
/// Handles task spawning, graceful shutdown, and resource cleanup.
#[derive(Debug)]
pub struct BridgeHandle {
    pub name: String,

    task_handle: Option<JoinHandle<Result<(), MappingError>>>,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl BridgeHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_handle: None,
            shutdown_tx: None,
        }
    }

    /// Starts the bridge in a tokio task and returns its channels.
    ///
    /// # Returns
    ///
    /// * Snapshot sender for input providers
    /// * Command receiver for the output dispatcher
    pub fn start(
        &mut self,
        bindings: Vec<Binding>,
        cycle_period: Duration,
    ) -> Result<(mpsc::Sender<InputSnapshot>, mpsc::Receiver<Vec<OutputCommand>>), MappingError>
    {
        let (snapshot_sender, snapshot_receiver) = mpsc::channel(100);
        let (command_sender, command_receiver) = mpsc::channel(100);
        let bridge_name = self.name.clone();

        let engine = BridgeEngine::create(
            snapshot_receiver,
            command_sender,
            bridge_name.clone(),
            cycle_period,
        )
        .configure(bindings)?;

        let active_engine = engine.activate();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        let task_handle = tokio::spawn(async move {
            info!("Spawning running bridge: {}", bridge_name);
            match active_engine.run_until_shutdown(shutdown_rx).await {
                Ok(deactivating_engine) => {
                    info!("Bridge entering deactivating state: {}", bridge_name);
                    let _ = deactivating_engine.shutdown().await;
                    Ok(())
                }
                Err(e) => {
                    error!("Error running bridge: {} - {}", bridge_name, e);
                    Err(e)
                }
            }
        });

        self.task_handle = Some(task_handle);

        info!("Bridge engine activated: {}", self.name);
        Ok((snapshot_sender, command_receiver))
    }

    /// Gracefully shuts down the bridge and waits for task completion.
    /// The release-all commands are sent before the task exits.
    pub async fn shutdown(&mut self) -> Result<(), MappingError> {
        debug!("Sending shutdown signal to bridge: {}", self.name);

        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Bridge task already terminated: {}", self.name);
            }
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => {
                    debug!("Bridge task completed: {}", self.name);
                    result
                }
                Err(e) => {
                    error!("Bridge task panicked: {} - {}", self.name, e);
                    Err(MappingError::TaskError(format!(
                        "Bridge task panicked: {}",
                        e
                    )))
                }
            }
        } else {
            debug!("Bridge already shut down: {}", self.name);
            Ok(())
        }
    }
}
