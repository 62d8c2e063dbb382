//! Address types for CLAW.
//!
//! - [`MetaAddress`]: The static address a recipient publishes
//! - [`StealthAddress`]: A one-time address derived for a specific payment

use serde::{Deserialize, Serialize};

use super::PublicKey;
use crate::constants::{META_ADDRESS_SIZE, POINT_SIZE};
use crate::error::{ClawError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A meta-address published for receiving private payments.
///
/// # Wire Format
/// ```text
/// spending_public (32) || viewing_public (32)
/// ```
/// Transported as 128 lowercase hex characters. Only the length is checked
/// here; `claw_crypto::point::parse_meta_address` validates the curve points.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaAddress {
    /// Spending public key - the base of every one-time address
    pub spending: PublicKey,
    /// Viewing public key - the sender's ECDH counterparty
    pub viewing: PublicKey,
}

impl MetaAddress {
    /// Creates a meta-address from its two public keys.
    pub fn new(spending: PublicKey, viewing: PublicKey) -> Self {
        Self { spending, viewing }
    }

    /// Serializes to the 64-byte wire format.
    pub fn to_bytes(&self) -> [u8; META_ADDRESS_SIZE] {
        let mut bytes = [0u8; META_ADDRESS_SIZE];
        bytes[..POINT_SIZE].copy_from_slice(self.spending.as_bytes());
        bytes[POINT_SIZE..].copy_from_slice(self.viewing.as_bytes());
        bytes
    }

    /// Deserializes from the 64-byte wire format.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the length is not exactly 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != META_ADDRESS_SIZE {
            return Err(ClawError::InvalidFormat(format!(
                "meta-address must be {} bytes, got {}",
                META_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        Ok(Self {
            spending: PublicKey::from_bytes(&bytes[..POINT_SIZE])?,
            viewing: PublicKey::from_bytes(&bytes[POINT_SIZE..])?,
        })
    }

    /// Encodes as hex (128 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decodes from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for MetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaAddress")
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}

impl std::fmt::Display for MetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for MetaAddress {
    type Err = ClawError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for MetaAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MetaAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A one-time address produced by the sender for a single payment.
///
/// `address` is a valid ed25519 public key; whoever knows the matching spend
/// scalar controls funds sent to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthAddress {
    /// The one-time public key funds are sent to
    pub address: PublicKey,
    /// Sender's ephemeral public key `E = e·B`
    pub ephemeral_public_key: PublicKey,
    /// First byte of the shared-secret hash, for cheap filtering
    pub view_tag: u8,
}

impl StealthAddress {
    /// Creates a new stealth address.
    pub fn new(address: PublicKey, ephemeral_public_key: PublicKey, view_tag: u8) -> Self {
        Self {
            address,
            ephemeral_public_key,
            view_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample() -> MetaAddress {
        MetaAddress::new(
            PublicKey::from_array([0x11; POINT_SIZE]),
            PublicKey::from_array([0x22; POINT_SIZE]),
        )
    }

    #[test]
    fn test_meta_address_bytes_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), META_ADDRESS_SIZE);
        assert!(bytes[..32].iter().all(|&b| b == 0x11));
        assert!(bytes[32..].iter().all(|&b| b == 0x22));
    }

    #[test]
    fn test_meta_address_hex_roundtrip() {
        let meta = sample();
        let encoded = meta.to_hex();
        assert_eq!(encoded.len(), 128);
        assert_eq!(MetaAddress::from_hex(&encoded).unwrap(), meta);
        assert_eq!(encoded.parse::<MetaAddress>().unwrap(), meta);
    }

    #[test_case(0 ; "empty")]
    #[test_case(32 ; "one key")]
    #[test_case(63 ; "one short")]
    #[test_case(65 ; "one long")]
    fn test_meta_address_wrong_length(len: usize) {
        let result = MetaAddress::from_bytes(&vec![0u8; len]);
        assert!(matches!(result, Err(ClawError::InvalidFormat(_))));
    }

    #[test]
    fn test_meta_address_bad_hex() {
        assert!(matches!(
            MetaAddress::from_hex("not-hex"),
            Err(ClawError::HexError(_))
        ));
    }

    #[test]
    fn test_meta_address_serde_is_hex_string() {
        let meta = sample();
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, format!("\"{}\"", meta.to_hex()));
        let back: MetaAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_stealth_address_serde() {
        let sa = StealthAddress::new(
            PublicKey::from_array([1; POINT_SIZE]),
            PublicKey::from_array([2; POINT_SIZE]),
            0x7f,
        );
        let json = serde_json::to_string(&sa).unwrap();
        assert!(json.contains("\"view_tag\":127"));
        let back: StealthAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sa);
    }
}
