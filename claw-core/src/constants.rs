//! Protocol constants for CLAW.
//!
//! Curve sizes follow Edwards25519 (RFC 8032 point encoding). Domain
//! separators are fixed for protocol version 1; changing any of them breaks
//! compatibility with every published record.

// ═══════════════════════════════════════════════════════════════════════════════
// CURVE SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a compressed Edwards25519 point in bytes.
pub const POINT_SIZE: usize = 32;

/// Size of a canonical scalar (mod ℓ) in bytes.
pub const SCALAR_SIZE: usize = 32;

/// Size of a serialized meta-address: spending point || viewing point.
pub const META_ADDRESS_SIZE: usize = 2 * POINT_SIZE;

/// Size of the shared secret encoding (a compressed point).
pub const SHARED_SECRET_SIZE: usize = POINT_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TAG CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of possible view tag values (2^8 = 256).
/// A one-byte tag gives a 1/256 false positive rate for the cheap filter.
pub const VIEW_TAG_SPACE: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// HASH / CIPHER SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Output size of the protocol hash (SHA3-256).
pub const HASH_SIZE: usize = 32;

/// Symmetric key size (AES-256-GCM).
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// AEAD nonce size (AES-GCM, 96-bit).
pub const NONCE_SIZE: usize = 12;

/// AEAD authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Smallest possible sealed field: nonce plus tag over an empty plaintext.
pub const MIN_SEALED_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// Serialized amount size (u64 little-endian).
pub const AMOUNT_SIZE: usize = 8;

/// Upper bound on memo length in bytes.
pub const MAX_MEMO_SIZE: usize = 512;

/// Exact size of a sealed amount field: nonce || 8-byte ciphertext || tag.
pub const SEALED_AMOUNT_SIZE: usize = NONCE_SIZE + AMOUNT_SIZE + TAG_SIZE;

/// Lamports in one SOL. Amounts are always carried in the smallest unit.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS
// ═══════════════════════════════════════════════════════════════════════════════
// Appended after the hashed material: tweak = H(h || STEALTH), key = H(S || ENCRYPT).

/// Domain separator for the one-time address tweak.
pub const DOMAIN_STEALTH: &[u8] = b"claw-stealth-v1";

/// Domain separator for the payload encryption key.
pub const DOMAIN_ENCRYPT: &[u8] = b"claw-encrypt-v1";

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL VERSIONING
// ═══════════════════════════════════════════════════════════════════════════════

/// Current protocol version, also the registry file format version.
pub const PROTOCOL_VERSION: u8 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY / SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length of a sender hint attached to a transfer record.
pub const MAX_SENDER_HINT_LEN: usize = 64;

/// Records may be stamped at most this far in the future (seconds).
pub const MAX_CLOCK_SKEW_SECS: u64 = 3600;

/// Default number of records between scanner progress callbacks.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;
