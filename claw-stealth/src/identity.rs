//! Recipient identities.
//!
//! An identity holds two independent key pairs:
//! - Spending keys: needed to move funds out of one-time addresses
//! - Viewing keys: enough to find and decrypt incoming transfers (can be delegated)

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use claw_core::{ClawError, Identity, IdentityExport, PublicKey, Result, SecretKey};
use claw_crypto::{generate_keypair_with_rng, keypair_from_secret};

/// Generates a new identity with independent random spending and viewing keys.
///
/// # Errors
/// Returns `RandomnessFailure` if the OS RNG cannot be read. The failure is
/// fatal for the caller; nothing is retried here.
///
/// # Example
///
/// ```rust
/// use claw_stealth::generate_identity;
///
/// let identity = generate_identity()?;
/// assert_eq!(identity.meta_address().to_hex().len(), 128);
/// # Ok::<(), claw_core::ClawError>(())
/// ```
pub fn generate_identity() -> Result<Identity> {
    generate_identity_with_rng(&mut OsRng)
}

/// Generates an identity from the supplied RNG.
pub fn generate_identity_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Identity> {
    let spending = generate_keypair_with_rng(rng)?;
    let viewing = generate_keypair_with_rng(rng)?;
    Ok(Identity::new(spending, viewing))
}

/// Rebuilds an identity from custody-held secrets.
///
/// # Errors
/// Returns `InvalidFormat` if either secret is not a canonical non-zero scalar.
pub fn identity_from_secrets(spending: SecretKey, viewing: SecretKey) -> Result<Identity> {
    Ok(Identity::new(
        keypair_from_secret(spending)?,
        keypair_from_secret(viewing)?,
    ))
}

/// Rebuilds an identity from its export and checks the public halves agree.
///
/// # Errors
/// Returns `ValidationError` if the exported public keys or meta-address do
/// not match the ones derived from the secrets.
pub fn identity_from_export(export: &IdentityExport) -> Result<Identity> {
    let identity = identity_from_secrets(
        SecretKey::from_hex(&export.spending_private)?,
        SecretKey::from_hex(&export.viewing_private)?,
    )?;

    if identity.spending.public != PublicKey::from_hex(&export.spending_public)?
        || identity.viewing.public != PublicKey::from_hex(&export.viewing_public)?
    {
        return Err(ClawError::ValidationError(
            "exported public keys do not match the secrets".into(),
        ));
    }

    if identity.meta_address().to_hex() != export.meta_address.trim().to_lowercase() {
        return Err(ClawError::ValidationError(
            "exported meta-address does not match the keys".into(),
        ));
    }

    Ok(identity)
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEWING KEY DELEGATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan-only credentials: viewing secret plus spending public key.
///
/// Holders can discover and decrypt transfers but never spend them.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ViewingKeyExport {
    /// Viewing secret key (hex)
    pub viewing_private: String,
    /// Spending public key (hex)
    pub spending_public: String,
}

impl ViewingKeyExport {
    /// Extracts the scan-only credentials from an identity.
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            viewing_private: identity.viewing.secret.to_hex(),
            spending_public: identity.spending.public.to_hex(),
        }
    }

    /// Decodes the credentials.
    pub fn decode(&self) -> Result<(SecretKey, PublicKey)> {
        Ok((
            SecretKey::from_hex(&self.viewing_private)?,
            PublicKey::from_hex(&self.spending_public)?,
        ))
    }
}

impl std::fmt::Debug for ViewingKeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKeyExport")
            .field("spending_public", &self.spending_public)
            .field("viewing_private", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_crypto::{decode_point, parse_meta_address, public_from_secret};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_identity_generation() {
        let identity = generate_identity().unwrap();

        assert_ne!(identity.spending.public, identity.viewing.public);
        assert!(decode_point(&identity.spending.public).is_ok());
        assert!(decode_point(&identity.viewing.public).is_ok());

        let meta = identity.meta_address();
        let parsed = parse_meta_address(&meta.to_bytes()).unwrap();
        assert_eq!(parsed.meta_address(), meta);
    }

    #[test]
    fn test_identities_are_independent() {
        let a = generate_identity().unwrap();
        let b = generate_identity().unwrap();
        assert_ne!(a.meta_address(), b.meta_address());
    }

    #[test]
    fn test_seeded_identity_is_reproducible() {
        let a = generate_identity_with_rng(&mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        let b = generate_identity_with_rng(&mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        assert_eq!(a.meta_address(), b.meta_address());
    }

    #[test]
    fn test_from_secrets_restores_publics() {
        let original = generate_identity().unwrap();
        let restored = identity_from_secrets(
            SecretKey::from_array(*original.spending.secret.as_bytes()),
            SecretKey::from_array(*original.viewing.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(restored.meta_address(), original.meta_address());
        assert_eq!(
            public_from_secret(&restored.spending.secret).unwrap(),
            original.spending.public
        );
    }

    #[test]
    fn test_export_roundtrip() {
        let identity = generate_identity().unwrap();
        let export = identity.export();

        let json = serde_json::to_string(&export).unwrap();
        let parsed: IdentityExport = serde_json::from_str(&json).unwrap();
        let restored = identity_from_export(&parsed).unwrap();

        assert_eq!(restored.meta_address(), identity.meta_address());
    }

    #[test]
    fn test_export_mismatch_rejected() {
        let identity = generate_identity().unwrap();
        let other = generate_identity().unwrap();

        let mut export = identity.export();
        export.viewing_public = other.viewing.public.to_hex();

        assert!(matches!(
            identity_from_export(&export),
            Err(ClawError::ValidationError(_))
        ));
    }

    #[test]
    fn test_viewing_key_export() {
        let identity = generate_identity().unwrap();
        let export = ViewingKeyExport::from_identity(&identity);
        let (viewing, spending) = export.decode().unwrap();

        assert_eq!(viewing.as_bytes(), identity.viewing.secret.as_bytes());
        assert_eq!(spending, identity.spending.public);
        assert!(format!("{:?}", export).contains("REDACTED"));
    }
}
