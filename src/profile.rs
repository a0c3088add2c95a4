//! Mapping-profile loading and validation
//!
//! A profile is a toml document of `[[bindings]]` entries. Target strings
//! keep the `prefix:name` spelling (`axis:AXIS_X`, `button:1`, `key:space`,
//! `led:landing_gear`) and are resolved to closed enums here, once, at load
//! time — an unknown prefix or name aborts startup instead of surfacing as
//! a runtime dispatch failure.

use crate::engine::types::{
    BindMode, Binding, LedTarget, LogicKind, OutputTarget, PulseTrigger, RetriggerPolicy, VJoyAxis,
};
use crate::engine::MappingError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_HZ: u32 = 60;

/// A loaded, fully validated mapping profile.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Polling rate of the bridge loop.
    pub hz: u32,
    /// Bindings in document order; evaluation order is this order.
    pub bindings: Vec<Binding>,
}

impl Profile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        info!("Loading mapping profile from {}", path.display());
        let text = fs::read_to_string(path)
            .map_err(|e| MappingError::ProfileError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, MappingError> {
        let raw: RawProfile = toml::from_str(text)
            .map_err(|e| MappingError::ProfileError(format!("invalid profile: {}", e)))?;

        let hz = raw.hz.unwrap_or(DEFAULT_HZ);
        if hz == 0 {
            return Err(MappingError::ConfigError("hz must be positive".into()));
        }

        let mut bindings = Vec::with_capacity(raw.bindings.len());
        for (index, entry) in raw.bindings.iter().enumerate() {
            let binding = entry.validate(index)?;
            debug!(
                "binding `{}`: {:?} {} -> {}",
                binding.id,
                binding.inputs,
                binding.logic,
                binding.target
            );
            bindings.push(binding);
        }

        info!("Profile loaded: {} bindings at {} Hz", bindings.len(), hz);
        Ok(Self { hz, bindings })
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.hz))
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct RawProfile {
    hz: Option<u32>,
    #[serde(default)]
    bindings: Vec<RawBinding>,
}

/// One `[[bindings]]` entry as written in the file, before validation.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawBinding {
    id: Option<String>,
    input: Option<String>,
    inputs: Option<Vec<String>>,
    logic: Option<LogicKind>,
    target: String,
    mode: Option<BindMode>,
    pulse_ms: Option<u64>,
    trigger: Option<PulseTrigger>,
    retrigger: Option<RetriggerPolicy>,
    invert: Option<bool>,
    scale: Option<f64>,
}

impl RawBinding {
    fn validate(&self, index: usize) -> Result<Binding, MappingError> {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| format!("binding{}", index));
        let fail = |reason: String| MappingError::ConfigError(format!("`{}`: {}", id, reason));

        let inputs = match (&self.input, &self.inputs) {
            (Some(_), Some(_)) => {
                return Err(fail("`input` and `inputs` are mutually exclusive".into()))
            }
            (Some(single), None) => vec![single.clone()],
            (None, Some(list)) if !list.is_empty() => list.clone(),
            _ => return Err(fail("at least one input is required".into())),
        };

        // Default logic follows the input count: a lone input passes
        // through, several inputs combine with `and`.
        let logic = self.logic.unwrap_or(if inputs.len() > 1 {
            LogicKind::And
        } else {
            LogicKind::Single
        });
        match logic {
            LogicKind::Single if inputs.len() != 1 => {
                return Err(fail("`single` logic takes exactly one input".into()))
            }
            LogicKind::And | LogicKind::Or | LogicKind::AllSame if inputs.len() < 2 => {
                return Err(fail(format!("`{}` logic requires at least two inputs", logic)))
            }
            _ => {}
        }

        let target = parse_target(&self.target).map_err(&fail)?;
        let mode = self.mode.unwrap_or(BindMode::Direct);

        let pulse_width = match (mode, self.pulse_ms) {
            (BindMode::Toggle, Some(ms)) if ms > 0 => Some(Duration::from_millis(ms)),
            (BindMode::Toggle, _) => {
                return Err(fail("toggle mode requires pulse_ms > 0".into()))
            }
            (BindMode::Direct, _) => None,
        };

        if matches!(target, OutputTarget::Axis(_)) {
            if mode == BindMode::Toggle {
                return Err(fail("axis targets only support direct mode".into()));
            }
            if logic != LogicKind::Single {
                return Err(fail("axis targets require `single` logic".into()));
            }
        }

        Ok(Binding {
            id,
            inputs,
            logic,
            target,
            mode,
            pulse_width,
            trigger: self.trigger.unwrap_or(PulseTrigger::OnChange),
            retrigger: self.retrigger.unwrap_or(RetriggerPolicy::Restart),
            invert: self.invert.unwrap_or(false),
            scale: self.scale.unwrap_or(1.0),
        })
    }
}

fn parse_target(raw: &str) -> Result<OutputTarget, String> {
    let (prefix, name) = raw
        .split_once(':')
        .ok_or_else(|| format!("target `{}` is not of the form `prefix:name`", raw))?;
    match prefix {
        "axis" => parse_axis(name)
            .map(OutputTarget::Axis)
            .ok_or_else(|| format!("unknown axis `{}`", name)),
        "button" => name
            .parse::<u32>()
            .map(OutputTarget::Button)
            .map_err(|_| format!("button id `{}` is not a number", name)),
        "key" => {
            if name.is_empty() {
                Err("empty key name".into())
            } else {
                Ok(OutputTarget::Key(name.to_string()))
            }
        }
        "led" => match name {
            "n_light" => Ok(OutputTarget::Led(LedTarget::NLight)),
            "l_light" => Ok(OutputTarget::Led(LedTarget::LLight)),
            "landing_gear" => Ok(OutputTarget::Led(LedTarget::LandingGear)),
            other => Err(format!("unknown led channel `{}`", other)),
        },
        other => Err(format!("unknown target prefix `{}`", other)),
    }
}

fn parse_axis(name: &str) -> Option<VJoyAxis> {
    let axis = match name {
        "AXIS_X" => VJoyAxis::X,
        "AXIS_Y" => VJoyAxis::Y,
        "AXIS_Z" => VJoyAxis::Z,
        "AXIS_RX" => VJoyAxis::Rx,
        "AXIS_RY" => VJoyAxis::Ry,
        "AXIS_RZ" => VJoyAxis::Rz,
        "AXIS_THROTTLE" => VJoyAxis::Throttle,
        "AXIS_RUDDER" => VJoyAxis::Rudder,
        "AXIS_SLIDER" => VJoyAxis::Slider,
        _ => return None,
    };
    Some(axis)
}
