//! Outbound frame encoding for the sunxi CEC device.
//!
//! A frame is written to the device as a single buffer of at most
//! [`MAX_FRAME_LEN`] bytes:
//! ```text
//! ┌───────────────────────┬──────────┬────────────────────┐
//! │ initiator │ dest      │  opcode  │    parameters      │
//! │  4 bits   │  4 bits   │  1 byte  │  0..=15 bytes      │
//! └───────────────────────┴──────────┴────────────────────┘
//! ```
//! The opcode and parameters are absent in polling frames.

use std::fmt;

use bytes::BufMut;

use crate::error::FrameError;
use crate::types::{Command, LogicalAddress, Opcode};

/// Maximum frame size accepted by the device (header + opcode + 15 parameters).
pub const MAX_FRAME_LEN: usize = 17;

/// Packs two logical addresses into a header byte, initiator in the high nibble.
#[must_use]
pub const fn pack_addresses(initiator: LogicalAddress, destination: LogicalAddress) -> u8 {
    (initiator.to_nibble() << 4) | (destination.to_nibble() & 0x0f)
}

/// Splits a header byte into `(initiator, destination)`.
#[must_use]
pub const fn unpack_addresses(header: u8) -> (LogicalAddress, LogicalAddress) {
    (
        LogicalAddress::from_nibble(header >> 4),
        LogicalAddress::from_nibble(header),
    )
}

/// Decodes the first `len` bytes of a device message buffer.
///
/// The header byte is always read, even when `len` is zero.
pub(crate) fn decode_message(msg: &[u8; MAX_FRAME_LEN], len: usize) -> Command {
    let len = len.min(MAX_FRAME_LEN);
    let (initiator, destination) = unpack_addresses(msg[0]);
    let opcode = (len > 1).then_some(Opcode(msg[1]));

    let mut command = Command::new(initiator, destination, opcode);
    if len > 2 {
        command.parameters.extend_from_slice(&msg[2..len]);
    }
    command
}

/// A fixed-capacity encoded frame.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    data: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl RawFrame {
    /// Encodes a command into a device frame.
    ///
    /// The size check counts the parameters even for polling commands,
    /// whose parameters are never written.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if the command does not fit.
    pub fn encode(command: &Command) -> Result<Self, FrameError> {
        let size = command.wire_len();
        if size > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge {
                size,
                max: MAX_FRAME_LEN,
            });
        }

        let mut data = [0u8; MAX_FRAME_LEN];
        let len = {
            let mut buf = &mut data[..];
            buf.put_u8(pack_addresses(command.initiator, command.destination));
            if let Some(opcode) = command.opcode {
                buf.put_u8(opcode.0);
                buf.put_slice(&command.parameters);
            }
            MAX_FRAME_LEN - buf.remaining_mut()
        };

        Ok(Self { data, len })
    }

    /// Wraps raw wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if `bytes` exceeds the capacity and
    /// [`FrameError::TooShort`] if it is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::TooShort { need: 1, got: 0 });
        }
        if bytes.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge {
                size: bytes.len(),
                max: MAX_FRAME_LEN,
            });
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len(),
        })
    }

    /// Decodes the frame back into a command.
    #[must_use]
    pub fn decode(&self) -> Command {
        decode_message(&self.data, self.len)
    }

    /// Returns the bytes to write.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Returns the full backing buffer, zero-padded past [`len`](Self::len).
    #[must_use]
    pub const fn buffer(&self) -> &[u8; MAX_FRAME_LEN] {
        &self.data
    }

    /// Number of bytes to write. Always at least one.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True for address-only frames.
    #[must_use]
    pub const fn is_poll(&self) -> bool {
        self.len == 1
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawFrame")
            .field(&hex::encode(self.as_bytes()))
            .finish()
    }
}
