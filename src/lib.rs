//! # sunxi-cec
//!
//! A Rust adapter for the Allwinner (sunxi) HDMI-CEC kernel device.
//!
//! This library bridges structured CEC commands and the driver's character
//! device: it encodes outbound commands into device frames, programs the
//! logical address, and runs a background thread that decodes inbound
//! events and hands received commands to a consumer.
//!
//! ## Features
//!
//! - Blocking session API usable from any thread
//! - Callback or bounded-channel (async `Stream`) delivery of received commands
//! - Type-safe logical/physical addresses and fixed-capacity frames
//! - Structured logging through `tracing`
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use sunxi_cec::{
//!     CecAdapter, Command, LogicalAddress, LogicalAddresses, Opcode, WriteHints, command_channel,
//! };
//!
//! fn main() -> Result<(), sunxi_cec::Error> {
//!     let (sender, mut commands) = command_channel(32);
//!     let adapter = CecAdapter::device("/dev/sunxi_hdmi_cec", &sender);
//!     adapter.open(Duration::from_secs(1), true)?;
//!
//!     adapter.set_logical_addresses(&LogicalAddresses::single(
//!         LogicalAddress::PlaybackDevice1,
//!     ))?;
//!     println!("Physical address: {}", adapter.physical_address());
//!
//!     // Put the TV into standby
//!     let standby = Command::new(
//!         LogicalAddress::PlaybackDevice1,
//!         LogicalAddress::Tv,
//!         Some(Opcode::STANDBY),
//!     );
//!     let state = adapter.write(&standby, WriteHints::default());
//!     println!("Standby: {state:?}");
//!
//!     if let Some(command) = commands.blocking_recv() {
//!         println!("Received: {command}");
//!     }
//!
//!     adapter.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Device-level encodings (frames, event records, ioctls)
//! - [`types`] - Protocol model (addresses, commands, adapter states)
//! - [`transport`] - Device handle abstraction and the character device
//! - [`event`] - Delivery of received commands to consumers
//! - [`dispatch`] - Background event-draining thread
//! - [`adapter`] - High-level [`CecAdapter`] session

pub mod adapter;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use adapter::{AdapterConfig, CecAdapter, DEFAULT_READ_TIMEOUT, WriteHints};
pub use dispatch::DispatchState;
pub use error::{Error, FrameError, Result};
pub use event::{CommandCallback, CommandReceiver, CommandSender, command_channel};
pub use protocol::{ControlRequest, EventType, InboundEvent, MAX_FRAME_LEN, RawFrame};
#[cfg(unix)]
pub use transport::{CharDevice, DeviceConfig};
pub use transport::Transport;
pub use types::{
    AdapterMessageState, AdapterType, Command, LogicalAddress, LogicalAddresses, Opcode,
    PhysicalAddress, VendorId,
};
