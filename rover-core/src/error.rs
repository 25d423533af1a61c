//! Errors in the library.
use thiserror::Error;

/// Errors produced by the core crate.
#[derive(Debug, Error)]
pub enum RoverError {
    /// A record value had an unexpected type.
    #[error("Record value type mismatch, expected {0}")]
    RecordValueTypeError(String),

    /// A record key was not found.
    #[error("Record key not found: {0}")]
    RecordKeyError(String),

    /// A replay buffer was asked for more transitions than it holds.
    #[error("Replay buffer holds {len} transitions, a batch of {requested} was requested")]
    NotEnoughTransitions {
        /// Number of transitions currently stored.
        len: usize,
        /// Requested batch size.
        requested: usize,
    },
}
