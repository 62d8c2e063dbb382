//! # CLAW Stealth Payments
//!
//! High-level API for sending and receiving stealth payments.
//!
//! This crate provides:
//!
//! - **Identity**: Generate, restore and export spending + viewing keys
//! - **Payment**: Derive one-time addresses and build transfer records
//! - **Discovery**: Find owned records and claim them
//!
//! ## Quick Start
//!
//! ```rust
//! use claw_stealth::{claim, generate_identity, scan_records, TransferBuilder};
//!
//! // Recipient: generate keys and publish the meta-address
//! let recipient = generate_identity()?;
//! let meta = recipient.meta_address();
//!
//! // Sender: build a record for 0.1 SOL
//! let record = TransferBuilder::new()
//!     .recipient(meta)
//!     .amount(100_000_000)
//!     .memo("thanks")
//!     .build()?;
//!
//! // Recipient: scan with the viewing key, then claim
//! let (found, _stats) = scan_records(
//!     std::slice::from_ref(&record),
//!     &recipient.viewing.secret,
//!     &recipient.spending.public,
//!     None,
//! )?;
//! let claimed = claim(&found[0], &recipient.viewing.secret, &recipient.spending.secret)?;
//! assert_eq!(claimed.amount, 100_000_000);
//! # Ok::<(), claw_core::ClawError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod discovery;
pub mod identity;
pub mod payment;

pub use discovery::{check_record, claim, scan_records, ClaimedTransfer, ScanStats};
pub use identity::{
    generate_identity, generate_identity_with_rng, identity_from_export, identity_from_secrets,
    ViewingKeyExport,
};
pub use payment::{create_transfer, derive_address, derive_address_with_rng, TransferBuilder};
