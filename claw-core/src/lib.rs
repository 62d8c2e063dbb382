//! # CLAW Core
//!
//! Core types, errors, and traits for CLAW stealth payments.
//!
//! This crate provides the foundational building blocks used by all other CLAW crates:
//!
//! - **Types**: Key material, meta-addresses, stealth addresses, transfer records
//! - **Errors**: The protocol error taxonomy
//! - **Constants**: Sizes and domain separators
//! - **Traits**: The transfer registry interface
//!
//! ## Example
//!
//! ```rust
//! use claw_core::{MetaAddress, ClawError};
//!
//! // Malformed meta-addresses are rejected before any curve operation
//! let err = MetaAddress::from_bytes(&[0u8; 10]).unwrap_err();
//! assert!(matches!(err, ClawError::InvalidFormat(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ClawError, Result};
pub use traits::*;
pub use types::*;
