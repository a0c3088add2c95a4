//! Error definitions for the binding evaluation engine

use thiserror::Error;

/// Errors raised while loading a profile or evaluating bindings.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Malformed binding or profile, fatal at load time.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// An input key referenced by a binding was absent from the snapshot,
    /// typically a disconnected device. Recovered per binding and per
    /// cycle; never aborts the evaluation pass.
    #[error("input `{0}` missing from snapshot")]
    MissingInput(String),

    /// Failure reading or parsing the profile file.
    #[error("profile error: {0}")]
    ProfileError(String),

    /// Failure communicating over channels.
    #[error("channel error: {0}")]
    ChannelError(String),

    /// Failure managing the bridge task.
    #[error("task error: {0}")]
    TaskError(String),
}
