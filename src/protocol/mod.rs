//! Device-level encodings for the sunxi CEC driver.
//!
//! This module contains the low-level protocol types including:
//! - Outbound frame encoding
//! - Inbound event records
//! - Control request (ioctl) numbers

pub mod control;
pub mod event;
pub mod frame;

pub use control::{ControlRequest, PHYSICAL_ADDRESS_LEN};
pub use event::{EVENT_HEADER_LEN, EVENT_RECORD_LEN, EventType, InboundEvent};
pub use frame::{MAX_FRAME_LEN, RawFrame, pack_addresses, unpack_addresses};
