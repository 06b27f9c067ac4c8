//! Error types for robot controller operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while commanding the arm or reading its state.
#[derive(Debug, Error)]
pub enum RobotError {
    /// Socket open/read/write against the controller failed.
    #[error("controller connection failed: {0}")]
    Connection(#[from] std::io::Error),

    /// A state frame was too short or its length field was inconsistent.
    #[error("malformed state frame: {0}")]
    MalformedFrame(String),

    /// An instruction string contained no recognized command token.
    #[error("no recognized command in instruction: {0:?}")]
    UnknownInstruction(String),

    /// The polled state did not reach the target within the configured timeout.
    #[error("motion did not converge within {0:?}")]
    ConvergenceTimeout(Duration),

    /// A convergence wait was cancelled through its cancellation token.
    #[error("wait cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RobotError>;
