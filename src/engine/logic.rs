//! Logic combinator: reduces a binding's inputs to one effective value
//!
//! Pure functions over one snapshot. A missing input key is reported as an
//! error to the caller; the evaluator decides the recovery policy (treat
//! the binding as unchanged for the cycle).

use crate::engine::error::MappingError;
use crate::engine::types::{Binding, InputSnapshot, InputValue, LogicKind};

/// Result of applying a binding's logic combinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effective {
    Switch(bool),
    Axis(f64),
}

impl Effective {
    pub fn as_switch(&self) -> bool {
        match self {
            Effective::Switch(state) => *state,
            Effective::Axis(value) => value.abs() > 0.5,
        }
    }
}

/// Computes the effective value for one binding against one snapshot.
///
/// `single` passes the sole input through unchanged, analog included. The
/// multi-input kinds coerce every input to boolean and reduce:
/// `and` requires all true, `or` any true, `all_same` agreement in either
/// polarity.
pub fn combine(binding: &Binding, snapshot: &InputSnapshot) -> Result<Effective, MappingError> {
    match binding.logic {
        LogicKind::Single => {
            let key = &binding.inputs[0];
            match snapshot.get(key) {
                Some(InputValue::Switch(state)) => Ok(Effective::Switch(state)),
                Some(InputValue::Axis(value)) => Ok(Effective::Axis(value)),
                None => Err(MappingError::MissingInput(key.clone())),
            }
        }
        LogicKind::And => {
            let states = collect_switches(binding, snapshot)?;
            Ok(Effective::Switch(states.iter().all(|s| *s)))
        }
        LogicKind::Or => {
            let states = collect_switches(binding, snapshot)?;
            Ok(Effective::Switch(states.iter().any(|s| *s)))
        }
        LogicKind::AllSame => {
            let states = collect_switches(binding, snapshot)?;
            let first = states[0];
            Ok(Effective::Switch(states.iter().all(|s| *s == first)))
        }
    }
}

/// Resolves every input key to a boolean, failing on the first absent key.
fn collect_switches(
    binding: &Binding,
    snapshot: &InputSnapshot,
) -> Result<Vec<bool>, MappingError> {
    binding
        .inputs
        .iter()
        .map(|key| {
            snapshot
                .get(key)
                .map(|value| value.as_switch())
                .ok_or_else(|| MappingError::MissingInput(key.clone()))
        })
        .collect()
}
