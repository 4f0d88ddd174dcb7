//! Error types for the sunxi-cec library.

use thiserror::Error;

use crate::protocol::ControlRequest;

/// The main error type for adapter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the device handle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A control request returned a non-zero status.
    #[error("{request} failed with status {status}")]
    Control {
        request: ControlRequest,
        status: i32,
    },

    /// The device accepted fewer bytes than the frame holds.
    #[error("sent command error: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The device handle is not open.
    #[error("device not open")]
    NotOpen,

    /// The background dispatch thread could not be started.
    #[error("failed to start dispatch thread: {0}")]
    Dispatch(#[source] std::io::Error),
}

/// Frame-specific errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Encoded frame exceeds the device frame capacity.
    #[error("data size too large: {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },

    /// Event record shorter than its fixed header.
    #[error("event record too short: need at least {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
