//! Input side: snapshot providers for physical devices
//!
//! The engine only ever sees [`InputSnapshot`]s; where they come from is
//! behind this seam. The shipped provider reads joysticks/gamepads through
//! gilrs. Panel- or HID-specific readers plug in the same way.

use crate::engine::InputSnapshot;

pub mod collector;

pub use collector::{CollectorError, CollectorSettings, StickCollector};

/// Anything that can produce a point-in-time snapshot of its inputs.
///
/// Called once per polling cycle. Implementations may omit keys for
/// devices that are currently disconnected.
pub trait InputProvider {
    fn snapshot(&mut self) -> InputSnapshot;
}
