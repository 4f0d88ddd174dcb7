//! Logical and physical bus addresses.

use std::fmt;

/// A 4-bit CEC logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogicalAddress {
    /// Television.
    Tv = 0,
    /// Recording device 1.
    RecordingDevice1 = 1,
    /// Recording device 2.
    RecordingDevice2 = 2,
    /// Tuner 1.
    Tuner1 = 3,
    /// Playback device 1.
    PlaybackDevice1 = 4,
    /// Audio system.
    AudioSystem = 5,
    /// Tuner 2.
    Tuner2 = 6,
    /// Tuner 3.
    Tuner3 = 7,
    /// Playback device 2.
    PlaybackDevice2 = 8,
    /// Recording device 3.
    RecordingDevice3 = 9,
    /// Tuner 4.
    Tuner4 = 10,
    /// Playback device 3.
    PlaybackDevice3 = 11,
    /// Reserved.
    Reserved1 = 12,
    /// Reserved.
    Reserved2 = 13,
    /// Free use.
    FreeUse = 14,
    /// Unregistered as initiator, broadcast as destination.
    Broadcast = 15,
}

impl LogicalAddress {
    const ALL: [Self; 16] = [
        Self::Tv,
        Self::RecordingDevice1,
        Self::RecordingDevice2,
        Self::Tuner1,
        Self::PlaybackDevice1,
        Self::AudioSystem,
        Self::Tuner2,
        Self::Tuner3,
        Self::PlaybackDevice2,
        Self::RecordingDevice3,
        Self::Tuner4,
        Self::PlaybackDevice3,
        Self::Reserved1,
        Self::Reserved2,
        Self::FreeUse,
        Self::Broadcast,
    ];

    /// Builds an address from the low four bits of `nibble`.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self::ALL[(nibble & 0x0f) as usize]
    }

    /// Parses an address, rejecting values above 15.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte <= 0x0f {
            Some(Self::from_nibble(byte))
        } else {
            None
        }
    }

    /// Returns the 4-bit wire value.
    #[must_use]
    pub const fn to_nibble(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        matches!(self, Self::Broadcast)
    }

    /// Iterates over all sixteen addresses in ascending order.
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter()
    }
}

impl From<LogicalAddress> for u8 {
    fn from(addr: LogicalAddress) -> Self {
        addr as Self
    }
}

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.to_nibble())
    }
}

/// A set of logical addresses claimed by one adapter.
///
/// The primary address is the one programmed into the device; the others
/// are tracked for callers that answer on several addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalAddresses {
    primary: Option<LogicalAddress>,
    mask: u16,
}

impl LogicalAddresses {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            primary: None,
            mask: 0,
        }
    }

    /// Creates a set holding only `addr`, which becomes the primary.
    #[must_use]
    pub const fn single(addr: LogicalAddress) -> Self {
        Self {
            primary: Some(addr),
            mask: 1 << addr as u16,
        }
    }

    /// Adds an address. The first address added becomes the primary.
    pub fn set(&mut self, addr: LogicalAddress) {
        if self.primary.is_none() {
            self.primary = Some(addr);
        }
        self.mask |= 1 << u16::from(u8::from(addr));
    }

    #[must_use]
    pub const fn primary(&self) -> Option<LogicalAddress> {
        self.primary
    }

    #[must_use]
    pub const fn contains(&self, addr: LogicalAddress) -> bool {
        self.mask & (1 << addr as u16) != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Iterates over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = LogicalAddress> + '_ {
        LogicalAddress::iter().filter(|addr| self.contains(*addr))
    }
}

impl FromIterator<LogicalAddress> for LogicalAddresses {
    fn from_iter<I: IntoIterator<Item = LogicalAddress>>(iter: I) -> Self {
        let mut addresses = Self::new();
        for addr in iter {
            addresses.set(addr);
        }
        addresses
    }
}

/// A 16-bit HDMI physical address (`a.b.c.d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalAddress(pub u16);

impl PhysicalAddress {
    /// Sentinel returned when the address could not be read.
    pub const INVALID: Self = Self(0xFFFF);

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{}.{}.{}.{}",
            (v >> 12) & 0xf,
            (v >> 8) & 0xf,
            (v >> 4) & 0xf,
            v & 0xf
        )
    }
}
