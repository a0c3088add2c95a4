//! Binding evaluation engine
//!
//! Converts raw input-device readings into output commands once per
//! polling cycle, according to per-binding rules: multi-input boolean
//! combination, edge/level triggering and timed pulse generation.
//!
//! ```text
//! InputSnapshot ──► for each Binding:
//!     logic combinator ──► edge detector ──► mode dispatch ──► commands
//!                                                │
//!                                          [pulse timer]
//! ```
//!
//! All per-binding state lives in [`BindingEngine`]; snapshots are borrowed
//! for one cycle and commands are moved out to the dispatcher.

pub mod command;
pub mod edge;
pub mod error;
pub mod evaluator;
pub mod logic;
pub mod pulse;
pub mod types;

pub use error::MappingError;
pub use evaluator::BindingEngine;
pub use types::{
    BindMode, Binding, InputSnapshot, InputValue, LedTarget, LogicKind, OutputCommand,
    OutputTarget, PanelLight, PulseTrigger, RetriggerPolicy, VJoyAxis,
};
