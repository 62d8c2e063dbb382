//! Domain types for CLAW.
//!
//! This module provides the core data structures used throughout the protocol:
//!
//! - [`KeyPair`] / [`Identity`]: Spending and viewing key material
//! - [`MetaAddress`]: Published address for receiving private payments
//! - [`StealthAddress`]: One-time address for a specific payment
//! - [`TransferRecord`]: Registry entry carrying the ephemeral key, view tag and sealed payload

mod address;
mod keys;
mod record;

pub use address::*;
pub use keys::*;
pub use record::*;
