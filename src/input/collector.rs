//! gilrs-backed snapshot collector
//!
//! Drains gilrs events into a current-value table and publishes one
//! [`InputSnapshot`] per polling cycle over a tokio channel. Uses a statum
//! state machine so a collector cannot be polled before it has looked for
//! a device.

use crate::engine::{InputSnapshot, InputValue};
use crate::input::InputProvider;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::HashMap;
use std::time::Duration;
use statum::{machine, state};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Stick deflections below this magnitude read as centered.
    pub joystick_deadzone: f32,
    /// Key prefix for this device, e.g. `x55` -> `x55.axis.0`.
    pub device_name: String,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
            device_name: "stick".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send snapshot: {0}")]
    SnapshotSendError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct StickCollector<S: CollectionState> {
    // gilrs context
    gilrs: Gilrs,

    // Active gamepad
    active_gamepad: Option<GamepadId>,

    settings: CollectorSettings,

    // Channel for publishing snapshots to the bridge
    snapshot_sender: mpsc::Sender<InputSnapshot>,

    // Current values, updated from drained events
    axes: HashMap<u32, f64>,
    buttons: HashMap<u32, bool>,
}

impl<S: CollectionState> StickCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl StickCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        snapshot_sender: mpsc::Sender<InputSnapshot>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating stick collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            None,
            settings,
            snapshot_sender,
            HashMap::new(),
            HashMap::new(),
        ))
    }

    /// Looks for a connected device and transitions to Collecting.
    pub fn initialize(mut self) -> Result<StickCollector<Collecting>, CollectorError> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No device connected, snapshots will be empty until one appears");
        } else {
            info!("Found {} devices:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }
            self.active_gamepad = Some(gamepads[0].0);
        }

        Ok(self.transition())
    }
}

impl StickCollector<Collecting> {
    /// Drains all pending gilrs events into the current-value table.
    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    info!("Device {} connected", id);
                    if self.active_gamepad.is_none() {
                        self.active_gamepad = Some(id);
                    }
                }
                EventType::Disconnected => {
                    if self.active_gamepad == Some(id) {
                        // Drop all values so the keys vanish from the next
                        // snapshot; bindings referencing them go inactive.
                        warn!("Device {} disconnected, clearing input state", id);
                        self.active_gamepad = None;
                        self.axes.clear();
                        self.buttons.clear();
                    }
                }
                EventType::ButtonPressed(button, _) => {
                    if let Some(index) = button_index(button) {
                        self.buttons.insert(index, true);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(index) = button_index(button) {
                        self.buttons.insert(index, false);
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    if let Some(index) = axis_index(axis) {
                        let value = if value.abs() < self.settings.joystick_deadzone {
                            0.0
                        } else {
                            value
                        };
                        self.axes.insert(index, f64::from(value));
                    }
                }
                _ => {}
            }
        }
    }

    /// Builds a snapshot from the current values under this collector's
    /// device prefix.
    fn current_snapshot(&self) -> InputSnapshot {
        let device = &self.settings.device_name;
        let mut values = HashMap::with_capacity(self.axes.len() + self.buttons.len());
        for (index, value) in &self.axes {
            values.insert(format!("{}.axis.{}", device, index), InputValue::Axis(*value));
        }
        for (index, state) in &self.buttons {
            values.insert(
                format!("{}.button.{}", device, index),
                InputValue::Switch(*state),
            );
        }
        InputSnapshot::new(values)
    }

    /// Publishes snapshots at `period` until the shutdown signal arrives.
    pub async fn collect_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
        period: Duration,
    ) -> Result<(), CollectorError> {
        info!(
            "Collecting input for `{}` every {:?}",
            self.settings.device_name, period
        );

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for collector `{}`", self.settings.device_name);
                    return Ok(());
                }

                _ = tokio::time::sleep(period) => {
                    let snapshot = self.snapshot();
                    if let Err(e) = self.snapshot_sender.try_send(snapshot) {
                        // The bridge keeps only the latest snapshot anyway.
                        debug!("Snapshot not sent: {}", e);
                    }
                }
            }
        }
    }
}

impl InputProvider for StickCollector<Collecting> {
    fn snapshot(&mut self) -> InputSnapshot {
        self.drain_events();
        self.current_snapshot()
    }
}

/// Stable axis numbering, independent of the platform's event codes.
fn axis_index(axis: Axis) -> Option<u32> {
    match axis {
        Axis::LeftStickX => Some(0),
        Axis::LeftStickY => Some(1),
        Axis::RightStickX => Some(2),
        Axis::RightStickY => Some(3),
        Axis::LeftZ => Some(4),
        Axis::RightZ => Some(5),
        _ => None,
    }
}

/// Stable button numbering for the buttons the profiles can reference.
fn button_index(button: Button) -> Option<u32> {
    let index = match button {
        Button::South => 0,
        Button::East => 1,
        Button::North => 2,
        Button::West => 3,
        Button::LeftTrigger => 4,
        Button::RightTrigger => 5,
        Button::LeftTrigger2 => 6,
        Button::RightTrigger2 => 7,
        Button::Select => 8,
        Button::Start => 9,
        Button::LeftThumb => 10,
        Button::RightThumb => 11,
        Button::DPadUp => 12,
        Button::DPadDown => 13,
        Button::DPadLeft => 14,
        Button::DPadRight => 15,
        _ => return None,
    };
    Some(index)
}
