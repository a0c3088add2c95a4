//! Shared data types for the binding evaluation engine
//!
//! Defines the input snapshot the collectors produce, the binding
//! descriptors the profile loader emits, and the output commands the
//! dispatcher consumes.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// One raw input reading, either a switch/button level or an analog axis.
///
/// Axis values are nominally -1.0..=1.0; anything outside is clamped by the
/// command builder, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue {
    Switch(bool),
    Axis(f64),
}

impl InputValue {
    /// Boolean view of the value; an axis reads as "deflected past center".
    pub fn as_switch(&self) -> bool {
        match self {
            InputValue::Switch(state) => *state,
            InputValue::Axis(value) => value.abs() > 0.5,
        }
    }
}

/// Point-in-time view of all known inputs, keyed `device.channel.index`
/// (e.g. `flightpanel.switch.3`, `x55.axis.0`).
///
/// Built once per polling cycle by an input provider and read-only during
/// evaluation. Keys for disconnected devices are simply absent.
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    values: HashMap<String, InputValue>,
    captured_at: DateTime<Local>,
}

impl InputSnapshot {
    pub fn new(values: HashMap<String, InputValue>) -> Self {
        Self {
            values,
            captured_at: Local::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<InputValue> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, InputValue)> for InputSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, InputValue)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// How a binding reduces its input values to one effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicKind {
    /// Sole input passed through (boolean or analog).
    Single,
    /// True iff every input is true.
    And,
    /// True iff at least one input is true.
    Or,
    /// True iff all inputs agree, regardless of polarity. Used for
    /// sync-style panel indications (two switches in the same position).
    AllSame,
}

impl fmt::Display for LogicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicKind::Single => write!(f, "single"),
            LogicKind::And => write!(f, "and"),
            LogicKind::Or => write!(f, "or"),
            LogicKind::AllSame => write!(f, "all_same"),
        }
    }
}

/// Level-triggered mirroring vs. edge-triggered timed pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    Direct,
    Toggle,
}

/// Which edge arms a toggle-mode pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseTrigger {
    OnChange,
    OnPress,
    OnRelease,
}

/// What happens when a trigger fires while a pulse is already armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Restart the full pulse window from the new trigger time. The second
    /// trigger is never swallowed, at the cost of a longer total ON time.
    Restart,
    /// Let the pending release stand; the new trigger is dropped.
    Ignore,
}

/// Virtual joystick axes the output device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VJoyAxis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Throttle,
    Rudder,
    Slider,
}

impl fmt::Display for VJoyAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VJoyAxis::X => "AXIS_X",
            VJoyAxis::Y => "AXIS_Y",
            VJoyAxis::Z => "AXIS_Z",
            VJoyAxis::Rx => "AXIS_RX",
            VJoyAxis::Ry => "AXIS_RY",
            VJoyAxis::Rz => "AXIS_RZ",
            VJoyAxis::Throttle => "AXIS_THROTTLE",
            VJoyAxis::Rudder => "AXIS_RUDDER",
            VJoyAxis::Slider => "AXIS_SLIDER",
        };
        write!(f, "{}", name)
    }
}

/// Panel LED channels addressable from a binding.
///
/// `LandingGear` is a convenience target: the builder fans it out to the N
/// and L position lights with the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedTarget {
    NLight,
    LLight,
    LandingGear,
}

/// Physical panel lights, after composite targets are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLight {
    N,
    L,
}

impl fmt::Display for PanelLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelLight::N => write!(f, "N"),
            PanelLight::L => write!(f, "L"),
        }
    }
}

/// Where a binding's result goes. Resolved once at profile load from the
/// `prefix:name` spelling; unknown prefixes are rejected there, not at
/// evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Axis(VJoyAxis),
    Button(u32),
    Key(String),
    Led(LedTarget),
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Axis(axis) => write!(f, "axis:{}", axis),
            OutputTarget::Button(id) => write!(f, "button:{}", id),
            OutputTarget::Key(key) => write!(f, "key:{}", key),
            OutputTarget::Led(LedTarget::NLight) => write!(f, "led:n_light"),
            OutputTarget::Led(LedTarget::LLight) => write!(f, "led:l_light"),
            OutputTarget::Led(LedTarget::LandingGear) => write!(f, "led:landing_gear"),
        }
    }
}

/// One validated mapping rule, immutable for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: String,
    /// Input keys in profile order, length >= 1.
    pub inputs: Vec<String>,
    pub logic: LogicKind,
    pub target: OutputTarget,
    pub mode: BindMode,
    /// Pulse width for toggle mode. The effective minimum is one polling
    /// cycle: a shorter width releases at the first tick past its deadline.
    pub pulse_width: Option<Duration>,
    pub trigger: PulseTrigger,
    pub retrigger: RetriggerPolicy,
    /// Axis shaping, applied before clamping to -1.0..=1.0.
    pub invert: bool,
    pub scale: f64,
}

impl Binding {
    /// Plain direct binding from one boolean input to a target.
    pub fn direct(id: impl Into<String>, input: impl Into<String>, target: OutputTarget) -> Self {
        Self {
            id: id.into(),
            inputs: vec![input.into()],
            logic: LogicKind::Single,
            target,
            mode: BindMode::Direct,
            pulse_width: None,
            trigger: PulseTrigger::OnChange,
            retrigger: RetriggerPolicy::Restart,
            invert: false,
            scale: 1.0,
        }
    }
}

/// One command for the output side, produced during a cycle and moved to
/// the dispatcher immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputCommand {
    Axis { axis: VJoyAxis, value: f64 },
    Button { id: u32, pressed: bool },
    Key { key: String, pressed: bool },
    Led { light: PanelLight, on: bool },
}

impl fmt::Display for OutputCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputCommand::Axis { axis, value } => write!(f, "{} = {:.3}", axis, value),
            OutputCommand::Button { id, pressed } => {
                write!(f, "button:{} {}", id, if *pressed { "ON" } else { "OFF" })
            }
            OutputCommand::Key { key, pressed } => {
                write!(f, "key:{} {}", key, if *pressed { "ON" } else { "OFF" })
            }
            OutputCommand::Led { light, on } => {
                write!(f, "led:{} {}", light, if *on { "ON" } else { "OFF" })
            }
        }
    }
}
