//! Adapter status and identity types.

/// Outcome of handing a message to the adapter.
///
/// The sunxi device only ever reports [`SentAcked`](Self::SentAcked) or
/// [`Error`](Self::Error); the other states exist for adapters that track
/// messages through a send queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMessageState {
    /// State not known.
    Unknown,
    /// Queued, not yet on the bus.
    WaitingToBeSent,
    /// Sent, acknowledgment still pending.
    Sent,
    /// Sent, destination did not acknowledge.
    SentNotAcked,
    /// Sent and acknowledged.
    SentAcked,
    /// Received from the bus.
    Received,
    /// Failed before or during transmission.
    Error,
}

impl AdapterMessageState {
    /// True if the destination acknowledged the message.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::SentAcked)
    }
}

/// IEEE OUI vendor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorId(pub u32);

impl VendorId {
    /// No vendor information available.
    pub const UNKNOWN: Self = Self(0);
}

/// Kind of adapter hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterType {
    /// Allwinner on-chip HDMI-CEC controller exposed as a character device.
    Sunxi,
}
