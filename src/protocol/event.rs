//! Inbound event records read from the sunxi CEC device.
//!
//! Every read returns one fixed-size record laid out like the driver's
//! `struct hdmi_cec_event` (native endianness, 4-byte alignment):
//! ```text
//! ┌──────────────┬──────────────┬──────────────────┬─────────┐
//! │  event_type  │   msg_len    │       msg        │ padding │
//! │   i32        │   i32        │    17 bytes      │ 3 bytes │
//! └──────────────┴──────────────┴──────────────────┴─────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::FrameError;
use crate::protocol::frame::{MAX_FRAME_LEN, RawFrame, decode_message, unpack_addresses};
use crate::types::{Command, LogicalAddress};

/// Size of the `event_type` and `msg_len` fields.
pub const EVENT_HEADER_LEN: usize = 8;

/// Size of one event record as the driver writes it.
pub const EVENT_RECORD_LEN: usize = (EVENT_HEADER_LEN + MAX_FRAME_LEN + 3) & !3;

/// Event classification reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EventType {
    /// A message was received from the bus.
    ReceiveSuccess = 1,
    /// A transmitted message was not acknowledged.
    NoAck = 2,
    /// The HDMI link went down.
    Disconnected = 3,
    /// The HDMI link came up.
    Connected = 4,
    /// A transmitted message was acknowledged.
    SendSuccess = 5,
}

impl EventType {
    /// Parses an event type from its raw value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::ReceiveSuccess),
            2 => Some(Self::NoAck),
            3 => Some(Self::Disconnected),
            4 => Some(Self::Connected),
            5 => Some(Self::SendSuccess),
            _ => None,
        }
    }
}

impl From<EventType> for i32 {
    fn from(kind: EventType) -> Self {
        kind as Self
    }
}

/// One event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundEvent {
    /// Raw event type; see [`event_type`](Self::event_type).
    pub raw_type: i32,
    /// Number of valid bytes in `msg`, clamped to `0..=MAX_FRAME_LEN`.
    pub len: usize,
    /// Message bytes as received from the bus.
    pub msg: [u8; MAX_FRAME_LEN],
}

impl InboundEvent {
    /// Builds an event carrying `frame`.
    #[must_use]
    pub fn from_frame(kind: EventType, frame: &RawFrame) -> Self {
        Self {
            raw_type: kind.into(),
            len: frame.len(),
            msg: *frame.buffer(),
        }
    }

    /// Parses a record as returned by a device read.
    ///
    /// A record cut short after the header is accepted; missing message
    /// bytes read as zero. Out-of-range lengths are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooShort`] if the header itself is incomplete.
    pub fn parse(mut data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < EVENT_HEADER_LEN {
            return Err(FrameError::TooShort {
                need: EVENT_HEADER_LEN,
                got: data.len(),
            });
        }

        let raw_type = data.get_i32_ne();
        let msg_len = data.get_i32_ne();

        let mut msg = [0u8; MAX_FRAME_LEN];
        let available = data.len().min(MAX_FRAME_LEN);
        msg[..available].copy_from_slice(&data[..available]);

        Ok(Self {
            raw_type,
            len: usize::try_from(msg_len).unwrap_or(0).min(MAX_FRAME_LEN),
            msg,
        })
    }

    /// Serializes the event into the driver's record layout.
    #[must_use]
    pub fn to_record(&self) -> [u8; EVENT_RECORD_LEN] {
        let mut record = [0u8; EVENT_RECORD_LEN];
        let mut buf = &mut record[..];
        buf.put_i32_ne(self.raw_type);
        buf.put_i32_ne(self.len as i32);
        buf.put_slice(&self.msg);
        record
    }

    /// Returns the classification, or `None` for values this driver
    /// revision does not define.
    #[must_use]
    pub const fn event_type(&self) -> Option<EventType> {
        EventType::from_raw(self.raw_type)
    }

    /// Returns `(initiator, destination)` from the header byte.
    #[must_use]
    pub const fn addresses(&self) -> (LogicalAddress, LogicalAddress) {
        unpack_addresses(self.msg[0])
    }

    /// Decodes the carried message.
    ///
    /// Only [`EventType::ReceiveSuccess`] events carry a command.
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        match self.event_type() {
            Some(EventType::ReceiveSuccess) => Some(decode_message(&self.msg, self.len)),
            _ => None,
        }
    }

    /// Returns the valid message bytes.
    #[must_use]
    pub fn message(&self) -> &[u8] {
        &self.msg[..self.len.min(MAX_FRAME_LEN)]
    }
}
