//! Binding evaluator: the per-cycle evaluation pass
//!
//! Owns all per-binding runtime state and converts one input snapshot into
//! the output commands for that cycle. Bindings are evaluated in profile
//! order, each one isolated: a missing input or odd value on one binding
//! never prevents evaluation of the rest.

use crate::engine::command::{axis_command, switch_commands};
use crate::engine::edge::{Edge, EdgeDetector};
use crate::engine::error::MappingError;
use crate::engine::logic::{combine, Effective};
use crate::engine::pulse::{ArmOutcome, PulseTimer};
use crate::engine::types::{
    BindMode, Binding, InputSnapshot, OutputCommand, OutputTarget, PulseTrigger,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime state for one binding, owned exclusively by the engine.
#[derive(Debug, Default)]
struct BindingState {
    edge: EdgeDetector,
    pulse: PulseTimer,
    /// Last boolean level actually emitted, used to suppress redundant
    /// re-sends and to drive the shutdown release-all pass.
    emitted: Option<bool>,
}

/// The binding evaluation engine.
///
/// One instance per bridge; state is never shared. `tick_at` takes an
/// explicit clock reading so timing behavior is deterministic under test,
/// `tick` is the production entry point.
pub struct BindingEngine {
    bindings: Vec<Binding>,
    states: Vec<BindingState>,
    cycle_period: Duration,
    last_tick: Option<Instant>,
}

impl BindingEngine {
    pub fn new(bindings: Vec<Binding>, cycle_period: Duration) -> Self {
        info!(
            "Initializing binding engine with {} bindings at {:?} cycle period",
            bindings.len(),
            cycle_period
        );
        let states = bindings.iter().map(|_| BindingState::default()).collect();
        Self {
            bindings,
            states,
            cycle_period,
            last_tick: None,
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Runs one evaluation cycle against the current wall clock.
    pub fn tick(&mut self, snapshot: &InputSnapshot) -> Vec<OutputCommand> {
        self.tick_at(snapshot, Instant::now())
    }

    /// Runs one evaluation cycle at an explicit instant.
    ///
    /// Armed pulse timers are polled for expiry before any input-driven
    /// transition, so a pulse releases on time even when the snapshot has
    /// not changed since it was armed.
    pub fn tick_at(&mut self, snapshot: &InputSnapshot, now: Instant) -> Vec<OutputCommand> {
        self.check_cycle_gap(now);

        let mut commands = Vec::new();

        // Expiry sweep first: release every pulse whose deadline passed.
        for (binding, state) in self.bindings.iter().zip(self.states.iter_mut()) {
            if state.pulse.poll(now) {
                debug!("pulse expired for binding `{}`", binding.id);
                emit_level(binding, state, false, &mut commands);
            }
        }

        // Input-driven pass, profile order.
        for (binding, state) in self.bindings.iter().zip(self.states.iter_mut()) {
            match combine(binding, snapshot) {
                Ok(effective) => evaluate_binding(binding, state, effective, now, &mut commands),
                Err(MappingError::MissingInput(key)) => {
                    // Device disconnected: binding stays at its previous
                    // value this cycle, everything else keeps evaluating.
                    debug!(
                        "binding `{}` inactive this cycle, input `{}` absent",
                        binding.id, key
                    );
                }
                Err(e) => {
                    warn!("binding `{}` failed to evaluate: {}", binding.id, e);
                }
            }
        }

        commands
    }

    /// Release-all pass: every binding whose last emitted level is ON gets
    /// an OFF, and armed pulses release immediately. Guarantees no output
    /// device is left latched after the bridge stops.
    pub fn shutdown(&mut self) -> Vec<OutputCommand> {
        info!("Release-all pass over {} bindings", self.bindings.len());
        let mut commands = Vec::new();
        for (binding, state) in self.bindings.iter().zip(self.states.iter_mut()) {
            state.pulse.cancel();
            if state.emitted == Some(true) {
                debug!("releasing binding `{}`", binding.id);
                emit_level(binding, state, false, &mut commands);
            }
        }
        commands
    }

    /// Logs a skew warning when the gap between ticks exceeds twice the
    /// configured cycle period. A stretched gap can stretch a pulse; the
    /// timer still releases exactly once.
    fn check_cycle_gap(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            let gap = now.duration_since(last);
            if gap > self.cycle_period * 2 {
                warn!(
                    "cycle gap {:?} exceeds expected period {:?}, pulses may be stretched",
                    gap, self.cycle_period
                );
            }
        }
        self.last_tick = Some(now);
    }
}

/// Mode dispatch for one binding after its effective value is known.
fn evaluate_binding(
    binding: &Binding,
    state: &mut BindingState,
    effective: Effective,
    now: Instant,
    commands: &mut Vec<OutputCommand>,
) {
    // Analog passthrough: a single analog input driving an axis mirrors the
    // shaped value every cycle.
    if let (Effective::Axis(raw), OutputTarget::Axis(axis)) = (effective, &binding.target) {
        commands.push(axis_command(binding, *axis, raw));
        return;
    }

    let level = effective.as_switch();
    let edge = state.edge.observe(level);

    match binding.mode {
        BindMode::Direct => {
            // Level-triggered: mirror the current effective value.
            emit_level(binding, state, level, commands);
        }
        BindMode::Toggle => {
            let should_arm = match binding.trigger {
                PulseTrigger::OnChange => edge != Edge::Unchanged,
                PulseTrigger::OnPress => edge == Edge::Rose,
                PulseTrigger::OnRelease => edge == Edge::Fell,
            };
            if !should_arm {
                return;
            }

            // Width is validated at load; toggle without it never reaches
            // the engine.
            let width = binding.pulse_width.unwrap_or(Duration::ZERO);
            match state.pulse.arm(now, width, binding.retrigger) {
                ArmOutcome::Started => {
                    debug!("binding `{}` pulse armed for {:?}", binding.id, width);
                    emit_level(binding, state, true, commands);
                }
                ArmOutcome::Restarted => {
                    debug!("binding `{}` pulse retriggered, window restarted", binding.id);
                    // Output is already ON; only the deadline moved.
                    emit_level(binding, state, true, commands);
                }
                ArmOutcome::Ignored => {
                    debug!("binding `{}` trigger ignored, pulse already armed", binding.id);
                }
            }
        }
    }
}

/// Emits the commands for a boolean level unless that level was already
/// sent. Suppression is an optimization only; the dispatcher is idempotent
/// and the observable semantics are identical without it.
fn emit_level(
    binding: &Binding,
    state: &mut BindingState,
    level: bool,
    commands: &mut Vec<OutputCommand>,
) {
    if state.emitted == Some(level) {
        return;
    }
    state.emitted = Some(level);
    commands.extend(switch_commands(&binding.target, level));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{InputValue, LedTarget, PanelLight, RetriggerPolicy, VJoyAxis};
    use std::collections::HashMap;

    const PERIOD: Duration = Duration::from_millis(10);

    fn snapshot(pairs: &[(&str, bool)]) -> InputSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), InputValue::Switch(*v)))
            .collect()
    }

    fn toggle_binding(trigger: PulseTrigger, pulse_ms: u64) -> Binding {
        let mut b = Binding::direct("t", "panel.switch.0", OutputTarget::Key("space".into()));
        b.mode = BindMode::Toggle;
        b.trigger = trigger;
        b.pulse_width = Some(Duration::from_millis(pulse_ms));
        b
    }

    #[test]
    fn direct_mode_mirrors_level() {
        let b = Binding::direct("d", "panel.switch.0", OutputTarget::Button(4));
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        let t0 = Instant::now();

        let on = engine.tick_at(&snapshot(&[("panel.switch.0", true)]), t0);
        assert_eq!(
            on,
            vec![OutputCommand::Button {
                id: 4,
                pressed: true
            }]
        );

        // Held level: suppressed re-send, no new commands.
        let held = engine.tick_at(&snapshot(&[("panel.switch.0", true)]), t0 + PERIOD);
        assert!(held.is_empty());

        let off = engine.tick_at(&snapshot(&[("panel.switch.0", false)]), t0 + PERIOD * 2);
        assert_eq!(
            off,
            vec![OutputCommand::Button {
                id: 4,
                pressed: false
            }]
        );
    }

    #[test]
    fn missing_input_keeps_previous_output_and_other_bindings_run() {
        let a = Binding::direct("a", "panel.switch.0", OutputTarget::Button(1));
        let b = Binding::direct("b", "panel.switch.1", OutputTarget::Button(2));
        let mut engine = BindingEngine::new(vec![a, b], PERIOD);
        let t0 = Instant::now();

        let first = engine.tick_at(
            &snapshot(&[("panel.switch.0", true), ("panel.switch.1", false)]),
            t0,
        );
        assert_eq!(first.len(), 2);

        // switch.0 disappears; binding `a` holds, binding `b` still evaluates.
        let second = engine.tick_at(&snapshot(&[("panel.switch.1", true)]), t0 + PERIOD);
        assert_eq!(
            second,
            vec![OutputCommand::Button {
                id: 2,
                pressed: true
            }]
        );
    }

    #[test]
    fn on_press_pulse_on_then_off() {
        let b = toggle_binding(PulseTrigger::OnPress, 100);
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        let t0 = Instant::now();

        // Baseline at released.
        assert!(engine
            .tick_at(&snapshot(&[("panel.switch.0", false)]), t0)
            .is_empty());

        let pressed = engine.tick_at(&snapshot(&[("panel.switch.0", true)]), t0 + PERIOD);
        assert_eq!(
            pressed,
            vec![OutputCommand::Key {
                key: "space".into(),
                pressed: true
            }]
        );

        // Input released before the pulse ends: on_press emits nothing.
        let released = engine.tick_at(&snapshot(&[("panel.switch.0", false)]), t0 + PERIOD * 3);
        assert!(released.is_empty());

        // Pulse deadline passes with an unchanged snapshot.
        let expired = engine.tick_at(
            &snapshot(&[("panel.switch.0", false)]),
            t0 + PERIOD + Duration::from_millis(100),
        );
        assert_eq!(
            expired,
            vec![OutputCommand::Key {
                key: "space".into(),
                pressed: false
            }]
        );
    }

    #[test]
    fn on_release_fires_on_falling_edge_only() {
        let b = toggle_binding(PulseTrigger::OnRelease, 50);
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        let t0 = Instant::now();

        engine.tick_at(&snapshot(&[("panel.switch.0", false)]), t0);
        assert!(engine
            .tick_at(&snapshot(&[("panel.switch.0", true)]), t0 + PERIOD)
            .is_empty());
        let fell = engine.tick_at(&snapshot(&[("panel.switch.0", false)]), t0 + PERIOD * 2);
        assert_eq!(fell.len(), 1);
    }

    #[test]
    fn ignore_policy_drops_second_trigger() {
        let mut b = toggle_binding(PulseTrigger::OnChange, 100);
        b.retrigger = RetriggerPolicy::Ignore;
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        let t0 = Instant::now();

        engine.tick_at(&snapshot(&[("panel.switch.0", false)]), t0);
        let armed = engine.tick_at(&snapshot(&[("panel.switch.0", true)]), t0 + PERIOD);
        assert_eq!(armed.len(), 1);

        // Second edge mid-pulse is dropped; original deadline stands.
        let mid = engine.tick_at(
            &snapshot(&[("panel.switch.0", false)]),
            t0 + PERIOD + Duration::from_millis(50),
        );
        assert!(mid.is_empty());
        let expired = engine.tick_at(
            &snapshot(&[("panel.switch.0", false)]),
            t0 + PERIOD + Duration::from_millis(100),
        );
        assert_eq!(
            expired,
            vec![OutputCommand::Key {
                key: "space".into(),
                pressed: false
            }]
        );
    }

    #[test]
    fn analog_passthrough_mirrors_every_cycle() {
        let mut b = Binding::direct("ax", "x55.axis.0", OutputTarget::Axis(VJoyAxis::X));
        b.invert = true;
        b.scale = 0.5;
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        let t0 = Instant::now();

        let mut values = HashMap::new();
        values.insert("x55.axis.0".to_string(), InputValue::Axis(1.0));
        let snap = InputSnapshot::new(values);

        let cmds = engine.tick_at(&snap, t0);
        assert_eq!(
            cmds,
            vec![OutputCommand::Axis {
                axis: VJoyAxis::X,
                value: -0.5
            }]
        );
        // Same snapshot again mirrors again: axes are level outputs.
        assert_eq!(engine.tick_at(&snap, t0 + PERIOD).len(), 1);
    }

    #[test]
    fn shutdown_releases_latched_outputs_once() {
        let b = Binding::direct("d", "panel.switch.0", OutputTarget::Led(LedTarget::NLight));
        let mut engine = BindingEngine::new(vec![b], PERIOD);
        engine.tick_at(&snapshot(&[("panel.switch.0", true)]), Instant::now());

        let released = engine.shutdown();
        assert_eq!(
            released,
            vec![OutputCommand::Led {
                light: PanelLight::N,
                on: false
            }]
        );
        // A second pass has nothing left to release.
        assert!(engine.shutdown().is_empty());
    }
}
