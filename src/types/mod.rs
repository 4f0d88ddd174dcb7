//! Protocol model types.
//!
//! This module contains the structures shared by the encoder, the decoder
//! and the consumers of decoded commands:
//! - Logical and physical addresses
//! - Commands and opcodes
//! - Adapter status and identity

pub mod adapter;
pub mod address;
pub mod command;

pub use adapter::{AdapterMessageState, AdapterType, VendorId};
pub use address::{LogicalAddress, LogicalAddresses, PhysicalAddress};
pub use command::{Command, Opcode};
