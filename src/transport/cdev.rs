//! Character-device transport implementation.
//!
//! This module talks to the sunxi HDMI-CEC driver through its device node:
//! `read`/`write` carry events and frames, `ioctl` carries control requests.
#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::ControlRequest;
use crate::transport::Transport;

/// Device node created by the sunxi HDMI-CEC driver.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/sunxi_hdmi_cec";

/// Configuration for the character-device transport.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device node path.
    pub path: PathBuf,
}

impl DeviceConfig {
    /// Creates a configuration for the given device node.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sets the device node path.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_PATH)
    }
}

/// Transport over the sunxi HDMI-CEC character device.
///
/// The file is shared behind a read-write lock: reads, writes and ioctls
/// share it, `open`/`close` take it exclusively.
pub struct CharDevice {
    config: DeviceConfig,
    name: String,
    file: RwLock<Option<File>>,
}

impl CharDevice {
    /// Creates a transport with the given configuration (not yet opened).
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        let name = config.path.display().to_string();
        Self {
            config,
            name,
            file: RwLock::new(None),
        }
    }

    /// Creates a transport for the given device node.
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self::new(DeviceConfig::new(path.as_ref()))
    }

    fn handle(&self) -> RwLockReadGuard<'_, Option<File>> {
        self.file.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until the device is readable. Returns false on timeout.
    fn poll_readable(file: &File, timeout: Duration) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a valid pollfd for the duration of the call and
        // the descriptor stays open while the read guard is held.
        let rc = unsafe { libc::poll(&raw mut fds, 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(false);
        }
        if fds.revents & libc::POLLIN == 0
            && fds.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0
        {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("device reported poll events 0x{:x}", fds.revents),
            ));
        }
        Ok(true)
    }
}

impl Transport for CharDevice {
    fn open(&self, timeout: Duration) -> Result<()> {
        let mut file = self.file.write().unwrap_or_else(PoisonError::into_inner);
        if file.is_some() {
            return Ok(());
        }

        // Opening a device node does not block, so the timeout only
        // bounds callers of slower transports.
        tracing::info!(
            "opening CEC device: {} (timeout {}ms)",
            self.name,
            timeout.as_millis()
        );
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.config.path)?;
        *file = Some(handle);

        Ok(())
    }

    fn close(&self) {
        let mut file = self.file.write().unwrap_or_else(PoisonError::into_inner);
        if file.take().is_some() {
            tracing::info!("closed CEC device: {}", self.name);
        }
    }

    fn is_open(&self) -> bool {
        self.handle().is_some()
    }

    fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let guard = self.handle();
        let file = guard.as_ref().ok_or(Error::NotOpen)?;

        if !Self::poll_readable(file, timeout)? {
            return Ok(0);
        }
        match (&*file).read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        let guard = self.handle();
        let file = guard.as_ref().ok_or(Error::NotOpen)?;
        Ok((&*file).write(data)?)
    }

    fn control(&self, request: ControlRequest) -> Result<u32> {
        let guard = self.handle();
        let file = guard.as_ref().ok_or(Error::NotOpen)?;
        let fd = file.as_raw_fd();
        let code = request.code();

        let no_argument: libc::c_ulong = 0;
        let mut info: u32 = 0;
        // SAFETY: the descriptor is open while the guard is held. Value
        // arguments are passed by value as the driver expects; the
        // physical-address request writes at most four bytes into `info`.
        let status = unsafe {
            match request {
                ControlRequest::SetLogicalAddress(addr) => {
                    libc::ioctl(fd, code as _, libc::c_ulong::from(u8::from(addr)))
                }
                ControlRequest::StartDevice | ControlRequest::StopDevice => {
                    libc::ioctl(fd, code as _, no_argument)
                }
                ControlRequest::GetPhysicalAddress => libc::ioctl(fd, code as _, &raw mut info),
            }
        };

        if status != 0 {
            tracing::debug!(
                "{request} returned {status}: {}",
                io::Error::last_os_error()
            );
            return Err(Error::Control { request, status });
        }
        Ok(info)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
