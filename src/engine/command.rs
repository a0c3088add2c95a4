//! Output command builder
//!
//! Maps a binding's resolved state to typed commands. The composite
//! `led:landing_gear` target expands to the N and L position lights here,
//! so the rest of the engine only ever sees concrete channels.

use crate::engine::types::{Binding, LedTarget, OutputCommand, OutputTarget, PanelLight, VJoyAxis};

/// Builds the commands for a boolean result. One command for every target
/// except the landing-gear composite, which fans out to both panel lights.
pub fn switch_commands(target: &OutputTarget, on: bool) -> Vec<OutputCommand> {
    match target {
        OutputTarget::Button(id) => vec![OutputCommand::Button {
            id: *id,
            pressed: on,
        }],
        OutputTarget::Key(key) => vec![OutputCommand::Key {
            key: key.clone(),
            pressed: on,
        }],
        OutputTarget::Led(LedTarget::NLight) => vec![OutputCommand::Led {
            light: PanelLight::N,
            on,
        }],
        OutputTarget::Led(LedTarget::LLight) => vec![OutputCommand::Led {
            light: PanelLight::L,
            on,
        }],
        OutputTarget::Led(LedTarget::LandingGear) => vec![
            OutputCommand::Led {
                light: PanelLight::N,
                on,
            },
            OutputCommand::Led {
                light: PanelLight::L,
                on,
            },
        ],
        // A boolean driving an axis: full deflection or center.
        OutputTarget::Axis(axis) => vec![OutputCommand::Axis {
            axis: *axis,
            value: if on { 1.0 } else { 0.0 },
        }],
    }
}

/// Builds the command for an analog passthrough, applying the binding's
/// invert and scale before clamping to the -1.0..=1.0 target range.
/// Out-of-range input is clamped, never an error.
pub fn axis_command(binding: &Binding, axis: VJoyAxis, raw: f64) -> OutputCommand {
    let mut value = if binding.invert { -raw } else { raw };
    value *= binding.scale;
    OutputCommand::Axis {
        axis,
        value: value.clamp(-1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_gear_fans_out_to_both_lights() {
        let cmds = switch_commands(&OutputTarget::Led(LedTarget::LandingGear), true);
        assert_eq!(
            cmds,
            vec![
                OutputCommand::Led {
                    light: PanelLight::N,
                    on: true
                },
                OutputCommand::Led {
                    light: PanelLight::L,
                    on: true
                },
            ]
        );
    }

    #[test]
    fn plain_targets_build_one_command() {
        let cmds = switch_commands(&OutputTarget::Key("space".into()), true);
        assert_eq!(
            cmds,
            vec![OutputCommand::Key {
                key: "space".into(),
                pressed: true
            }]
        );
        assert_eq!(
            switch_commands(&OutputTarget::Led(LedTarget::NLight), false),
            vec![OutputCommand::Led {
                light: PanelLight::N,
                on: false
            }]
        );
    }

    #[test]
    fn axis_invert_scale_then_clamp() {
        let mut b = Binding::direct("a", "x55.axis.0", OutputTarget::Axis(VJoyAxis::X));
        b.invert = true;
        b.scale = 0.5;
        assert_eq!(
            axis_command(&b, VJoyAxis::X, 1.0),
            OutputCommand::Axis {
                axis: VJoyAxis::X,
                value: -0.5
            }
        );

        b.invert = false;
        b.scale = 3.0;
        assert_eq!(
            axis_command(&b, VJoyAxis::X, 0.9),
            OutputCommand::Axis {
                axis: VJoyAxis::X,
                value: 1.0
            }
        );
    }
}
