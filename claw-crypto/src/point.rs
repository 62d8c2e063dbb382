//! Point encoding and validation.
//!
//! Every public key that arrives from outside (meta-addresses, ephemeral keys
//! in registry records) goes through [`decode_point`] before it is used in a
//! scalar multiplication. A point is accepted only if it:
//!
//! 1. decompresses to a point on Edwards25519,
//! 2. is not of small order (the 8 torsion points, including the identity),
//! 3. lies in the prime-order subgroup.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};

use claw_core::{ClawError, MetaAddress, PublicKey, Result};

/// Decodes and validates a compressed Edwards25519 point.
///
/// # Errors
/// Returns `InvalidPoint` if the bytes do not decompress, encode a small-order
/// point, or encode a point outside the prime-order subgroup.
pub fn decode_point(key: &PublicKey) -> Result<EdwardsPoint> {
    let point = CompressedEdwardsY(*key.as_bytes())
        .decompress()
        .ok_or_else(|| ClawError::InvalidPoint("not a valid curve point".into()))?;

    if point.is_small_order() {
        return Err(ClawError::InvalidPoint("point has small order".into()));
    }

    if !point.is_torsion_free() {
        return Err(ClawError::InvalidPoint(
            "point is not in the prime-order subgroup".into(),
        ));
    }

    Ok(point)
}

/// Compresses a point into its 32-byte public key form.
pub fn encode_point(point: &EdwardsPoint) -> PublicKey {
    PublicKey::from_array(point.compress().to_bytes())
}

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A meta-address whose two halves decoded to valid points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedMetaAddress {
    /// Spending public point
    pub spending: EdwardsPoint,
    /// Viewing public point
    pub viewing: EdwardsPoint,
}

impl ValidatedMetaAddress {
    /// Returns the byte-level meta-address.
    pub fn meta_address(&self) -> MetaAddress {
        MetaAddress::new(encode_point(&self.spending), encode_point(&self.viewing))
    }
}

/// Parses a serialized meta-address for use.
///
/// # Errors
/// - `InvalidFormat` if the length is not 64 bytes (checked before any curve work)
/// - `InvalidPoint` if either half is not a usable point
pub fn parse_meta_address(bytes: &[u8]) -> Result<ValidatedMetaAddress> {
    let meta = MetaAddress::from_bytes(bytes)?;
    validate_meta_address(&meta)
}

/// Validates both halves of an already length-checked meta-address.
pub fn validate_meta_address(meta: &MetaAddress) -> Result<ValidatedMetaAddress> {
    Ok(ValidatedMetaAddress {
        spending: decode_point(&meta.spending)?,
        viewing: decode_point(&meta.viewing)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_core::constants::POINT_SIZE;
    use curve25519_dalek::scalar::Scalar;

    /// Encoding of (0, -1), the point of order 2.
    fn order_two_encoding() -> [u8; POINT_SIZE] {
        let mut bytes = [0xffu8; POINT_SIZE];
        bytes[0] = 0xec;
        bytes[POINT_SIZE - 1] = 0x7f;
        bytes
    }

    fn sample_point(seed: u64) -> EdwardsPoint {
        EdwardsPoint::mul_base(&Scalar::from(seed))
    }

    #[test]
    fn test_decode_roundtrip() {
        let point = sample_point(12345);
        let key = encode_point(&point);
        assert_eq!(decode_point(&key).unwrap(), point);
    }

    #[test]
    fn test_decode_rejects_off_curve() {
        let bad = (0u8..=255)
            .map(|b| {
                let mut bytes = [b; POINT_SIZE];
                bytes[POINT_SIZE - 1] &= 0x7f;
                bytes
            })
            .find(|bytes| CompressedEdwardsY(*bytes).decompress().is_none())
            .expect("some y coordinate has no matching x");

        let result = decode_point(&PublicKey::from_array(bad));
        assert!(matches!(result, Err(ClawError::InvalidPoint(_))));
    }

    #[test]
    fn test_decode_rejects_identity() {
        let mut identity = [0u8; POINT_SIZE];
        identity[0] = 1;
        let result = decode_point(&PublicKey::from_array(identity));
        assert!(matches!(result, Err(ClawError::InvalidPoint(_))));
    }

    #[test]
    fn test_decode_rejects_small_order() {
        for bytes in [[0u8; POINT_SIZE], order_two_encoding()] {
            let result = decode_point(&PublicKey::from_array(bytes));
            assert!(matches!(result, Err(ClawError::InvalidPoint(_))));
        }
    }

    #[test]
    fn test_decode_rejects_mixed_torsion() {
        let torsion = CompressedEdwardsY(order_two_encoding())
            .decompress()
            .unwrap();
        let mixed = sample_point(99) + torsion;
        assert!(!mixed.is_small_order());

        let result = decode_point(&encode_point(&mixed));
        assert!(matches!(result, Err(ClawError::InvalidPoint(_))));
    }

    #[test]
    fn test_parse_meta_address() {
        let spending = sample_point(1);
        let viewing = sample_point(2);
        let meta = MetaAddress::new(encode_point(&spending), encode_point(&viewing));

        let parsed = parse_meta_address(&meta.to_bytes()).unwrap();
        assert_eq!(parsed.spending, spending);
        assert_eq!(parsed.viewing, viewing);
        assert_eq!(parsed.meta_address(), meta);
    }

    #[test]
    fn test_parse_meta_address_wrong_length_before_curve() {
        let result = parse_meta_address(&[0u8; 63]);
        assert!(matches!(result, Err(ClawError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_meta_address_bad_half() {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(encode_point(&sample_point(3)).as_bytes());
        // viewing half is the all-zero small-order point
        let result = parse_meta_address(&bytes);
        assert!(matches!(result, Err(ClawError::InvalidPoint(_))));
    }
}
