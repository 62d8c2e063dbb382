//! Stealth address derivation (DKSAP).
//!
//! ## Sender
//!
//! ```text
//! e      ← random scalar,  E = e·B
//! S      = e·V                       (V = recipient viewing public key)
//! h      = SHA3-256(S)
//! tag    = h[0]
//! tweak  = SHA3-256(h || "claw-stealth-v1") mod ℓ
//! P      = spend_pub + tweak·B       (one-time address)
//! ```
//!
//! ## Recipient
//!
//! `S = v·E` yields the same point, so the recipient recomputes `tag` and `P`
//! with only the viewing secret and spending public key. Spending from `P`
//! needs `spend_priv + tweak`, which only the spending secret can produce.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use claw_core::constants::{DOMAIN_STEALTH, HASH_SIZE, SHARED_SECRET_SIZE};
use claw_core::{PublicKey, Result, SecretKey};

use crate::hash::{sha3_256, sha3_256_concat};
use crate::keys::{scalar_from_secret, secret_from_scalar, EphemeralSecret};
use crate::point::{decode_point, encode_point};
use crate::view_tag::compute_view_tag;

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressed encoding of the ECDH point `e·V = v·E`.
///
/// Never persisted. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    fn from_point(point: &EdwardsPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }

    /// Returns `h = SHA3-256(S)`.
    pub fn hash(&self) -> [u8; HASH_SIZE] {
        sha3_256(&self.0)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

/// Sender side: `S = e·V`.
pub fn sender_shared_secret(ephemeral: &EphemeralSecret, viewing: &EdwardsPoint) -> SharedSecret {
    SharedSecret::from_point(&(ephemeral.scalar() * viewing))
}

/// Recipient side: `S = v·E` from a record's ephemeral key.
///
/// # Errors
/// - `InvalidPoint` if the ephemeral key is not a usable point
/// - `InvalidFormat` if the viewing secret is not a canonical scalar
pub fn recipient_shared_secret(
    ephemeral_public_key: &PublicKey,
    viewing_private: &SecretKey,
) -> Result<SharedSecret> {
    let ephemeral = decode_point(ephemeral_public_key)?;
    let mut v = scalar_from_secret(viewing_private)?;
    let shared = SharedSecret::from_point(&(v * ephemeral));
    v.zeroize();
    Ok(shared)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TWEAK & ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// View tag and scalar tweak derived from one shared secret.
pub struct StealthTweak {
    /// First byte of `h`
    pub view_tag: u8,
    tweak: Scalar,
}

impl StealthTweak {
    /// Derives the view tag and `tweak = SHA3-256(h || DOMAIN_STEALTH) mod ℓ`.
    pub fn from_shared_secret(shared: &SharedSecret) -> Self {
        let mut h = shared.hash();
        let view_tag = compute_view_tag(&h);
        let tweak = Scalar::from_bytes_mod_order(sha3_256_concat(&[h.as_slice(), DOMAIN_STEALTH]));
        h.zeroize();
        Self { view_tag, tweak }
    }

    /// One-time public point `spend_pub + tweak·B`.
    pub fn stealth_point(&self, spending: &EdwardsPoint) -> EdwardsPoint {
        spending + EdwardsPoint::mul_base(&self.tweak)
    }

    /// One-time secret scalar `spend_priv + tweak`.
    pub fn spend_scalar(&self, spending_private: &Scalar) -> Scalar {
        spending_private + self.tweak
    }
}

impl Drop for StealthTweak {
    fn drop(&mut self) {
        self.tweak.zeroize();
    }
}

/// Computes the one-time address for the sender.
///
/// Returns `(address, view_tag)`.
pub fn derive_stealth_public(
    ephemeral: &EphemeralSecret,
    spending: &EdwardsPoint,
    viewing: &EdwardsPoint,
) -> (PublicKey, u8) {
    let shared = sender_shared_secret(ephemeral, viewing);
    let tweak = StealthTweak::from_shared_secret(&shared);
    (encode_point(&tweak.stealth_point(spending)), tweak.view_tag)
}

// ═══════════════════════════════════════════════════════════════════════════════
// OWNERSHIP
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of checking one record against a viewing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipCheck {
    /// View tag did not match; the record was rejected by the cheap filter
    TagMismatch,
    /// View tag matched but the address belongs to someone else
    FalsePositive,
    /// The record is addressed to these keys
    Owned,
    /// The ephemeral key is not a usable point
    Malformed,
}

impl OwnershipCheck {
    /// Returns true if the record is owned.
    pub fn is_owned(&self) -> bool {
        matches!(self, OwnershipCheck::Owned)
    }
}

/// Viewing secret plus spending public point, loaded once for many checks.
///
/// This is everything a scanner needs; it cannot spend.
pub struct ViewingKey {
    viewing: Scalar,
    spending: EdwardsPoint,
}

impl ViewingKey {
    /// Loads the viewing secret and decodes the spending public key.
    ///
    /// # Errors
    /// - `InvalidFormat` if the viewing secret is not canonical
    /// - `InvalidPoint` if the spending public key is not a usable point
    pub fn new(viewing_private: &SecretKey, spending_public: &PublicKey) -> Result<Self> {
        Ok(Self {
            viewing: scalar_from_secret(viewing_private)?,
            spending: decode_point(spending_public)?,
        })
    }

    /// Recomputes the shared secret for a record's ephemeral key.
    pub fn shared_secret(&self, ephemeral_public_key: &PublicKey) -> Result<SharedSecret> {
        let ephemeral = decode_point(ephemeral_public_key)?;
        Ok(SharedSecret::from_point(&(self.viewing * ephemeral)))
    }

    /// Runs both filters: view tag first, then the full address comparison.
    pub fn check(
        &self,
        stealth_address: &PublicKey,
        ephemeral_public_key: &PublicKey,
        view_tag: u8,
    ) -> OwnershipCheck {
        let shared = match self.shared_secret(ephemeral_public_key) {
            Ok(shared) => shared,
            Err(_) => return OwnershipCheck::Malformed,
        };
        let tweak = StealthTweak::from_shared_secret(&shared);

        if !bool::from(tweak.view_tag.ct_eq(&view_tag)) {
            return OwnershipCheck::TagMismatch;
        }

        if points_match(&tweak.stealth_point(&self.spending), stealth_address) {
            OwnershipCheck::Owned
        } else {
            OwnershipCheck::FalsePositive
        }
    }

    /// Exact ownership test, without the view tag shortcut.
    pub fn owns(&self, stealth_address: &PublicKey, ephemeral_public_key: &PublicKey) -> bool {
        match self.shared_secret(ephemeral_public_key) {
            Ok(shared) => {
                let tweak = StealthTweak::from_shared_secret(&shared);
                points_match(&tweak.stealth_point(&self.spending), stealth_address)
            }
            Err(_) => false,
        }
    }
}

impl Drop for ViewingKey {
    fn drop(&mut self) {
        self.viewing.zeroize();
    }
}

fn points_match(expected: &EdwardsPoint, actual: &PublicKey) -> bool {
    expected
        .compress()
        .as_bytes()
        .ct_eq(actual.as_bytes())
        .into()
}

/// Decides whether a one-time address belongs to the holder of these keys.
///
/// Any decode failure yields `false`; this never errors.
pub fn is_owner(
    stealth_address: &PublicKey,
    ephemeral_public_key: &PublicKey,
    viewing_private: &SecretKey,
    spending_public: &PublicKey,
) -> bool {
    ViewingKey::new(viewing_private, spending_public)
        .map(|key| key.owns(stealth_address, ephemeral_public_key))
        .unwrap_or(false)
}

/// Derives the secret scalar controlling a one-time address.
///
/// `(spending_private + tweak) mod ℓ`. Only meaningful when [`is_owner`]
/// holds for the same record; otherwise the result controls nothing.
///
/// # Errors
/// - `InvalidPoint` if the ephemeral key is not a usable point
/// - `InvalidFormat` if either secret is not a canonical scalar
pub fn derive_spend_scalar(
    ephemeral_public_key: &PublicKey,
    viewing_private: &SecretKey,
    spending_private: &SecretKey,
) -> Result<SecretKey> {
    let shared = recipient_shared_secret(ephemeral_public_key, viewing_private)?;
    let tweak = StealthTweak::from_shared_secret(&shared);
    let mut spend = scalar_from_secret(spending_private)?;
    let mut one_time = tweak.spend_scalar(&spend);
    let secret = secret_from_scalar(&one_time);
    spend.zeroize();
    one_time.zeroize();
    Ok(secret)
}
