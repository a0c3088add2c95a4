//! Command dispatcher task and backends

use crate::engine::OutputCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Applies commands to an output device. Idempotent and fire-and-forget:
/// applying the same state twice must be harmless, and implementations
/// must not block the dispatcher on hardware round-trips.
pub trait OutputDispatcher: Send + 'static {
    fn apply(&mut self, command: OutputCommand);
}

/// Log-only backend. Mirrors running without the vJoy driver installed:
/// every command is traced, nothing touches hardware.
#[derive(Debug, Default)]
pub struct DryRunDispatcher {
    applied: u64,
}

impl OutputDispatcher for DryRunDispatcher {
    fn apply(&mut self, command: OutputCommand) {
        self.applied += 1;
        debug!("dry-run apply: {}", command);
    }
}

/// Owns a backend and drains command batches until every sender is gone.
pub fn spawn_dispatcher(
    mut backend: Box<dyn OutputDispatcher>,
    mut command_rx: mpsc::Receiver<Vec<OutputCommand>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Output dispatcher running");
        while let Some(batch) = command_rx.recv().await {
            for command in batch {
                backend.apply(command);
            }
        }
        info!("Output dispatcher stopped, command channel closed");
    })
}
