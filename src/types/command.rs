//! Structured CEC commands.

use std::fmt;

use crate::types::address::LogicalAddress;

/// A CEC opcode byte.
///
/// Opcodes are kept as raw bytes so that vendor and future opcodes survive
/// decoding untouched. Common opcodes are available as constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(pub u8);

impl Opcode {
    pub const FEATURE_ABORT: Self = Self(0x00);
    pub const IMAGE_VIEW_ON: Self = Self(0x04);
    pub const TUNER_STEP_INCREMENT: Self = Self(0x05);
    pub const RECORD_OFF: Self = Self(0x0B);
    pub const TEXT_VIEW_ON: Self = Self(0x0D);
    pub const STANDBY: Self = Self(0x36);
    pub const USER_CONTROL_PRESSED: Self = Self(0x44);
    pub const USER_CONTROL_RELEASE: Self = Self(0x45);
    pub const GIVE_OSD_NAME: Self = Self(0x46);
    pub const SET_OSD_NAME: Self = Self(0x47);
    pub const SYSTEM_AUDIO_MODE_REQUEST: Self = Self(0x70);
    pub const GIVE_AUDIO_STATUS: Self = Self(0x71);
    pub const SET_SYSTEM_AUDIO_MODE: Self = Self(0x72);
    pub const REPORT_AUDIO_STATUS: Self = Self(0x7A);
    pub const ROUTING_CHANGE: Self = Self(0x80);
    pub const ROUTING_INFORMATION: Self = Self(0x81);
    pub const ACTIVE_SOURCE: Self = Self(0x82);
    pub const GIVE_PHYSICAL_ADDRESS: Self = Self(0x83);
    pub const REPORT_PHYSICAL_ADDRESS: Self = Self(0x84);
    pub const REQUEST_ACTIVE_SOURCE: Self = Self(0x85);
    pub const SET_STREAM_PATH: Self = Self(0x86);
    pub const DEVICE_VENDOR_ID: Self = Self(0x87);
    pub const VENDOR_COMMAND: Self = Self(0x89);
    pub const GIVE_DEVICE_VENDOR_ID: Self = Self(0x8C);
    pub const MENU_REQUEST: Self = Self(0x8D);
    pub const MENU_STATUS: Self = Self(0x8E);
    pub const GIVE_DEVICE_POWER_STATUS: Self = Self(0x8F);
    pub const REPORT_POWER_STATUS: Self = Self(0x90);
    pub const GET_MENU_LANGUAGE: Self = Self(0x91);
    pub const INACTIVE_SOURCE: Self = Self(0x9D);
    pub const CEC_VERSION: Self = Self(0x9E);
    pub const GET_CEC_VERSION: Self = Self(0x9F);
    pub const VENDOR_COMMAND_WITH_ID: Self = Self(0xA0);
    pub const ABORT: Self = Self(0xFF);
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.0
    }
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// One CEC message as seen by the protocol layer.
///
/// A command without an opcode is a polling message: only the address
/// header goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub initiator: LogicalAddress,
    pub destination: LogicalAddress,
    pub opcode: Option<Opcode>,
    pub parameters: Vec<u8>,
}

impl Command {
    /// Creates a command with no parameters.
    #[must_use]
    pub const fn new(
        initiator: LogicalAddress,
        destination: LogicalAddress,
        opcode: Option<Opcode>,
    ) -> Self {
        Self {
            initiator,
            destination,
            opcode,
            parameters: Vec::new(),
        }
    }

    /// Creates a polling message (address header only).
    #[must_use]
    pub const fn poll(initiator: LogicalAddress, destination: LogicalAddress) -> Self {
        Self::new(initiator, destination, None)
    }

    /// Appends one parameter byte.
    #[must_use]
    pub fn with_parameter(mut self, byte: u8) -> Self {
        self.parameters.push(byte);
        self
    }

    /// Appends parameter bytes in order.
    #[must_use]
    pub fn with_parameters(mut self, bytes: &[u8]) -> Self {
        self.parameters.extend_from_slice(bytes);
        self
    }

    #[must_use]
    pub const fn is_poll(&self) -> bool {
        self.opcode.is_none()
    }

    /// Number of bytes this command occupies on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        1 + usize::from(self.opcode.is_some()) + self.parameters.len()
    }
}

/// Renders the command as colon-separated wire bytes, e.g. `14:36`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}{:x}",
            self.initiator.to_nibble(),
            self.destination.to_nibble()
        )?;
        if let Some(opcode) = self.opcode {
            write!(f, ":{:02x}", opcode.0)?;
            for byte in &self.parameters {
                write!(f, ":{byte:02x}")?;
            }
        }
        Ok(())
    }
}
