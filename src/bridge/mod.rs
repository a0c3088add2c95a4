//! Async runner for the binding evaluation engine
//!
//! Couples the evaluator to the snapshot and command channels and drives
//! it at the profile's cycle rate in a background tokio task.

pub mod engine;

pub use engine::{BridgeEngine, BridgeHandle, BridgeState};
