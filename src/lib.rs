//! flightbridge: maps flight-sim hardware to virtual output devices
//!
//! Switch panels and joysticks on one side, a virtual joystick, keyboard
//! key-presses and panel LEDs on the other, connected by a declarative
//! mapping profile. The [`engine`] module holds the per-cycle binding
//! evaluation (logic combination, edge detection, timed pulses); the
//! [`bridge`] module runs it; [`input`] and [`output`] are the device
//! seams.

pub mod bridge;
pub mod engine;
pub mod input;
pub mod output;
pub mod profile;
