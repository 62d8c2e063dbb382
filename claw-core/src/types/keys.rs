//! Key types for CLAW.
//!
//! This module defines the key structures used in the protocol:
//!
//! - [`PublicKey`]: Compressed Edwards25519 point (32 bytes)
//! - [`SecretKey`]: Canonical scalar bytes (32 bytes, zeroized on drop)
//! - [`KeyPair`]: Combined public + secret key
//! - [`Identity`]: Independent spending and viewing key pairs
//!
//! These are byte-level containers. Point decoding and scalar arithmetic live
//! in `claw-crypto`, which is the only crate that builds them from curve values.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{POINT_SIZE, SCALAR_SIZE};
use crate::error::{ClawError, Result};
use crate::types::MetaAddress;

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A compressed Edwards25519 point.
///
/// Used for spending/viewing public keys, ephemeral public keys and one-time
/// stealth addresses. The bytes are not guaranteed to decode to a valid point;
/// `claw_crypto::point::decode_point` performs that check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PublicKey {
    bytes: [u8; POINT_SIZE],
}

impl PublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the length is not `POINT_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; POINT_SIZE] = bytes.try_into().map_err(|_| {
            ClawError::InvalidFormat(format!(
                "public key must be {} bytes, got {}",
                POINT_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes: arr })
    }

    /// Creates a public key from a fixed-size array.
    pub const fn from_array(bytes: [u8; POINT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; POINT_SIZE] {
        &self.bytes
    }

    /// Returns the hex-encoded key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parses a hex-encoded key.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Returns the base58 form (the way Solana displays account addresses).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }

    /// Returns true if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PublicKey({}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[POINT_SIZE - 4..])
        )
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECRET KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A private scalar in canonical little-endian form.
///
/// Zeroized on drop. Deliberately not `Clone`: secrets are moved to their
/// owner, never duplicated by accident. Never expose it in logs.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SCALAR_SIZE],
}

impl SecretKey {
    /// Creates a secret key from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the length is not `SCALAR_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(ClawError::InvalidFormat(format!(
                "secret key must be {} bytes, got {}",
                SCALAR_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; SCALAR_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a secret key from a fixed-size array.
    pub fn from_array(bytes: [u8; SCALAR_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8; SCALAR_SIZE] {
        &self.bytes
    }

    /// Hex-encodes the secret for handing back to a custodian.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parses a hex-encoded secret.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = hex::decode(s.trim())?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A scalar and its public point `secret · B`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    /// Public key (safe to share)
    #[zeroize(skip)]
    pub public: PublicKey,
    /// Secret key (keep private, auto-zeroized)
    pub secret: SecretKey,
}

impl KeyPair {
    /// Creates a new key pair from public and secret keys.
    pub fn new(public: PublicKey, secret: SecretKey) -> Self {
        Self { public, secret }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Spending key pair - its secret is needed to move funds out of stealth addresses.
pub type SpendingKeyPair = KeyPair;

/// Viewing key pair - its secret is enough to scan for and decrypt incoming transfers.
pub type ViewingKeyPair = KeyPair;

/// An identity able to receive private payments.
///
/// The two key pairs are drawn independently. Handing out only the viewing
/// secret lets a third party discover payments without being able to spend.
#[derive(ZeroizeOnDrop)]
pub struct Identity {
    /// Keys for spending from stealth addresses
    pub spending: SpendingKeyPair,
    /// Keys for scanning and decrypting transfers
    pub viewing: ViewingKeyPair,
}

impl Identity {
    /// Creates an identity from its two key pairs.
    pub fn new(spending: SpendingKeyPair, viewing: ViewingKeyPair) -> Self {
        Self { spending, viewing }
    }

    /// Returns the publishable meta-address.
    pub fn meta_address(&self) -> MetaAddress {
        MetaAddress::new(self.spending.public, self.viewing.public)
    }

    /// Exports every key as hex so the caller can take custody of it.
    pub fn export(&self) -> IdentityExport {
        IdentityExport {
            spending_public: self.spending.public.to_hex(),
            viewing_public: self.viewing.public.to_hex(),
            spending_private: self.spending.secret.to_hex(),
            viewing_private: self.viewing.secret.to_hex(),
            meta_address: self.meta_address().to_hex(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}

/// Identity as handed back to a caller: public and private halves, hex encoded.
///
/// The core never persists these; custody is the caller's job.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct IdentityExport {
    /// Spending public key (hex)
    pub spending_public: String,
    /// Viewing public key (hex)
    pub viewing_public: String,
    /// Spending secret key (hex)
    pub spending_private: String,
    /// Viewing secret key (hex)
    pub viewing_private: String,
    /// Meta-address (hex, 128 chars)
    pub meta_address: String,
}

impl std::fmt::Debug for IdentityExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityExport")
            .field("meta_address", &self.meta_address)
            .field("private", &"[REDACTED]")
            .finish()
    }
}
