//! # CLAW Cryptography
//!
//! Cryptographic primitives for the CLAW stealth payment protocol.
//!
//! This crate provides:
//!
//! - **Point**: Edwards25519 point decoding with small-order and subgroup checks
//! - **Keys**: Scalar generation, key pairs, single-use ephemeral secrets
//! - **Hash**: SHA3-256
//! - **View Tags**: Cheap first-stage filtering for scanners
//! - **Derivation**: One-time addresses, ownership checks, spend scalars (DKSAP)
//! - **Cipher**: AES-256-GCM sealing of amounts and memos
//!
//! ## Security Properties
//!
//! - Address comparisons are constant-time
//! - Secret scalars, shared secrets and payload keys are zeroized on drop
//! - Domain separators keep the address tweak and the payload key independent
//!
//! ## Example
//!
//! ```rust
//! use claw_crypto::{decode_point, derive_stealth_public, generate_keypair, is_owner, EphemeralSecret};
//!
//! let spending = generate_keypair()?;
//! let viewing = generate_keypair()?;
//!
//! // Sender side
//! let eph = EphemeralSecret::generate()?;
//! let (address, _view_tag) = derive_stealth_public(
//!     &eph,
//!     &decode_point(&spending.public)?,
//!     &decode_point(&viewing.public)?,
//! );
//!
//! // Recipient side
//! assert!(is_owner(&address, &eph.public_key(), &viewing.secret, &spending.public));
//! # Ok::<(), claw_core::ClawError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod cipher;
pub mod derive;
pub mod hash;
pub mod keys;
pub mod point;
pub mod view_tag;

// Re-export main functions at crate root
pub use cipher::{
    decrypt_payload, encrypt_payload, encrypt_payload_with_rng, open_payload, OpenedPayload,
    PayloadKey,
};
pub use derive::{
    derive_spend_scalar, derive_stealth_public, is_owner, OwnershipCheck, SharedSecret,
    StealthTweak, ViewingKey,
};
pub use hash::{sha3_256, sha3_256_concat};
pub use keys::{
    generate_keypair, generate_keypair_with_rng, keypair_from_secret, public_from_secret,
    EphemeralSecret,
};
pub use point::{decode_point, encode_point, parse_meta_address, ValidatedMetaAddress};
pub use view_tag::{compute_view_tag, ViewTagStats};
