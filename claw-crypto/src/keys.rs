//! Key material generation.
//!
//! Secret scalars are drawn as 64 bytes of entropy reduced mod ℓ, which gives
//! a distribution indistinguishable from uniform. All randomness comes from
//! the operating system RNG unless a caller supplies its own (tests only).

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use claw_core::{ClawError, KeyPair, PublicKey, Result, SecretKey};

use crate::point::{decode_point, encode_point};

// ═══════════════════════════════════════════════════════════════════════════════
// SCALARS
// ═══════════════════════════════════════════════════════════════════════════════

/// Draws a uniformly random non-zero scalar.
///
/// # Errors
/// Returns `RandomnessFailure` if the RNG cannot be read.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar> {
    let mut wide = Zeroizing::new([0u8; 64]);
    loop {
        rng.try_fill_bytes(wide.as_mut_slice())
            .map_err(|e| ClawError::RandomnessFailure(e.to_string()))?;
        let scalar = Scalar::from_bytes_mod_order_wide(&wide);
        if scalar != Scalar::ZERO {
            return Ok(scalar);
        }
    }
}

/// Loads a secret key as a scalar.
///
/// # Errors
/// Returns `InvalidFormat` if the bytes are not a canonical scalar (≥ ℓ).
pub fn scalar_from_secret(secret: &SecretKey) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*secret.as_bytes()))
        .ok_or_else(|| ClawError::InvalidFormat("secret key is not a canonical scalar".into()))
}

/// Stores a scalar as a secret key.
pub fn secret_from_scalar(scalar: &Scalar) -> SecretKey {
    SecretKey::from_array(scalar.to_bytes())
}

/// Returns `secret · B` for a stored secret.
pub fn public_from_secret(secret: &SecretKey) -> Result<PublicKey> {
    let mut scalar = scalar_from_secret(secret)?;
    let public = encode_point(&EdwardsPoint::mul_base(&scalar));
    scalar.zeroize();
    Ok(public)
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIRS
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates a key pair from the operating system RNG.
pub fn generate_keypair() -> Result<KeyPair> {
    generate_keypair_with_rng(&mut OsRng)
}

/// Generates a key pair from the supplied RNG.
pub fn generate_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<KeyPair> {
    let mut scalar = random_scalar(rng)?;
    let keypair = KeyPair::new(
        encode_point(&EdwardsPoint::mul_base(&scalar)),
        secret_from_scalar(&scalar),
    );
    scalar.zeroize();
    Ok(keypair)
}

/// Rebuilds a key pair from a custody-held secret.
///
/// # Errors
/// Returns `InvalidFormat` for a non-canonical or zero scalar.
pub fn keypair_from_secret(secret: SecretKey) -> Result<KeyPair> {
    let public = public_from_secret(&secret)?;
    if decode_point(&public).is_err() {
        return Err(ClawError::InvalidFormat("secret key is zero".into()));
    }
    Ok(KeyPair::new(public, secret))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EPHEMERAL SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// The sender's single-use secret `e` for one payment.
///
/// Not `Clone`: the value is moved into payload encryption and dropped there,
/// so the same `e` cannot be used for two payments. Zeroized on drop.
pub struct EphemeralSecret {
    scalar: Scalar,
    public: PublicKey,
}

impl EphemeralSecret {
    /// Draws a fresh ephemeral secret from the operating system RNG.
    pub fn generate() -> Result<Self> {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Draws a fresh ephemeral secret from the supplied RNG.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let scalar = random_scalar(rng)?;
        let public = encode_point(&EdwardsPoint::mul_base(&scalar));
        Ok(Self { scalar, public })
    }

    /// Returns `E = e·B`.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.scalar
    }
}

impl Drop for EphemeralSecret {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl std::fmt::Debug for EphemeralSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralSecret")
            .field("public", &self.public)
            .field("scalar", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_core::constants::SCALAR_SIZE;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_generate_keypair_consistent() {
        let keypair = generate_keypair().unwrap();
        assert_eq!(public_from_secret(&keypair.secret).unwrap(), keypair.public);
        assert!(decode_point(&keypair.public).is_ok());
    }

    #[test]
    fn test_generate_keypair_unique() {
        let a = generate_keypair().unwrap();
        let b = generate_keypair().unwrap();
        assert_ne!(a.public, b.public);
        assert_ne!(a.secret.as_bytes(), b.secret.as_bytes());
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = generate_keypair_with_rng(&mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        let b = generate_keypair_with_rng(&mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a.public, b.public);
    }

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_random_scalar_reports_rng_failure() {
        let result = random_scalar(&mut BrokenRng);
        assert!(matches!(result, Err(ClawError::RandomnessFailure(_))));
    }

    #[test]
    fn test_secret_is_canonical() {
        let keypair = generate_keypair().unwrap();
        assert!(scalar_from_secret(&keypair.secret).is_ok());
    }

    #[test]
    fn test_non_canonical_secret_rejected() {
        let secret = SecretKey::from_array([0xff; SCALAR_SIZE]);
        assert!(matches!(
            scalar_from_secret(&secret),
            Err(ClawError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_keypair_from_secret() {
        let original = generate_keypair().unwrap();
        let restored =
            keypair_from_secret(SecretKey::from_array(*original.secret.as_bytes())).unwrap();
        assert_eq!(restored.public, original.public);
    }

    #[test]
    fn test_keypair_from_zero_secret_rejected() {
        let result = keypair_from_secret(SecretKey::from_array([0u8; SCALAR_SIZE]));
        assert!(matches!(result, Err(ClawError::InvalidFormat(_))));
    }

    #[test]
    fn test_ephemeral_public_matches_scalar() {
        let eph = EphemeralSecret::generate().unwrap();
        let expected = encode_point(&EdwardsPoint::mul_base(eph.scalar()));
        assert_eq!(eph.public_key(), expected);
        assert!(format!("{:?}", eph).contains("REDACTED"));
    }

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {}
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source unavailable",
            )))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn test_rng_failure_surfaces() {
        let result = generate_keypair_with_rng(&mut FailingRng);
        assert!(matches!(result, Err(ClawError::RandomnessFailure(_))));

        let result = EphemeralSecret::generate_with_rng(&mut FailingRng);
        assert!(matches!(result, Err(ClawError::RandomnessFailure(_))));
    }
}
