//! Output side: dispatcher seam and backends
//!
//! The engine moves [`OutputCommand`]s to a dispatcher and never waits for
//! hardware acknowledgement. Real vJoy/keyboard/LED register-level I/O
//! lives behind [`OutputDispatcher`]; the crate ships the dry-run backend.

pub mod dispatcher;

pub use dispatcher::{spawn_dispatcher, DryRunDispatcher, OutputDispatcher};
