//! Control requests (ioctls) understood by the sunxi CEC driver.
//!
//! Request numbers follow the generic Linux `_IOC` encoding with the
//! driver's magic byte `'H'`.

use std::fmt;

use crate::types::LogicalAddress;

/// Driver ioctl magic.
pub const IOC_MAGIC: u8 = b'H';

/// Size of the buffer filled by [`ControlRequest::GetPhysicalAddress`].
pub const PHYSICAL_ADDRESS_LEN: usize = 4;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_NONE: u32 = 0;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, nr: u32, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((IOC_MAGIC as u32) << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
}

/// `_IOW('H', 1, unsigned char)`
pub const HDMICEC_IOC_SETLOGICALADDRESS: u32 = ioc(IOC_WRITE, 1, 1);
/// `_IO('H', 2)`
pub const HDMICEC_IOC_STARTDEVICE: u32 = ioc(IOC_NONE, 2, 0);
/// `_IO('H', 3)`
pub const HDMICEC_IOC_STOPDEVICE: u32 = ioc(IOC_NONE, 3, 0);
/// `_IOR('H', 4, unsigned char[4])`
pub const HDMICEC_IOC_GETPHYADDRESS: u32 = ioc(IOC_READ, 4, PHYSICAL_ADDRESS_LEN);

/// Out-of-band request issued to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Program the address the controller acknowledges on the bus.
    SetLogicalAddress(LogicalAddress),
    /// Enable the controller.
    StartDevice,
    /// Disable the controller.
    StopDevice,
    /// Read the HDMI physical address into a 4-byte buffer.
    GetPhysicalAddress,
}

impl ControlRequest {
    /// Returns the ioctl request number.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::SetLogicalAddress(_) => HDMICEC_IOC_SETLOGICALADDRESS,
            Self::StartDevice => HDMICEC_IOC_STARTDEVICE,
            Self::StopDevice => HDMICEC_IOC_STOPDEVICE,
            Self::GetPhysicalAddress => HDMICEC_IOC_GETPHYADDRESS,
        }
    }

    /// True if the driver writes a result buffer.
    #[must_use]
    pub const fn has_output(self) -> bool {
        matches!(self, Self::GetPhysicalAddress)
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetLogicalAddress(addr) => write!(f, "HDMICEC_IOC_SETLOGICALADDRESS({addr})"),
            Self::StartDevice => f.write_str("HDMICEC_IOC_STARTDEVICE"),
            Self::StopDevice => f.write_str("HDMICEC_IOC_STOPDEVICE"),
            Self::GetPhysicalAddress => f.write_str("HDMICEC_IOC_GETPHYADDRESS"),
        }
    }
}
