//! Transport layer for the CEC device.
//!
//! This module provides the abstraction over the kernel device handle.
//! Currently only the sunxi character device is implemented.

#[cfg(unix)]
pub mod cdev;
#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

use crate::error::Result;
use crate::protocol::ControlRequest;

/// Trait for device handle implementations.
///
/// All methods take `&self`: the dispatch thread reads while the caller
/// thread writes and issues control requests on the same handle, so an
/// implementation must tolerate one concurrent reader plus one concurrent
/// writer.
pub trait Transport: Send + Sync {
    /// Opens the device. Opening an open device is a no-op.
    fn open(&self, timeout: Duration) -> Result<()>;

    /// Closes the device. Closing a closed device is a no-op.
    fn close(&self);

    /// Returns true if the device is open.
    fn is_open(&self) -> bool;

    /// Reads one record, waiting at most `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived within the window.
    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Writes one frame and returns the number of bytes accepted.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Issues a control request.
    ///
    /// Returns the 32-bit result buffer for requests that have one
    /// (see [`ControlRequest::has_output`]), zero otherwise.
    fn control(&self, request: ControlRequest) -> Result<u32>;

    /// Human-readable name of the device, e.g. its path.
    fn name(&self) -> &str;
}

#[cfg(unix)]
pub use cdev::{CharDevice, DeviceConfig};
