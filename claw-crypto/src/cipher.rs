//! Amount and memo encryption.
//!
//! Both fields are sealed with AES-256-GCM under
//! `K = SHA3-256(S || "claw-encrypt-v1")`, each with its own random nonce:
//!
//! ```text
//! sealed = nonce (12) || ciphertext || tag (16)
//! ```
//!
//! The amount is a `u64` in lamports, sealed as 8 little-endian bytes. The
//! memo is UTF-8 and may be empty. Opening never returns plaintext whose tag
//! did not verify.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use claw_core::constants::{
    AMOUNT_SIZE, DOMAIN_ENCRYPT, MAX_MEMO_SIZE, MIN_SEALED_SIZE, NONCE_SIZE, SYMMETRIC_KEY_SIZE,
};
use claw_core::{ClawError, DecryptedPayload, EncryptedPayload, PublicKey, Result, SecretKey};

use crate::derive::{recipient_shared_secret, sender_shared_secret, SharedSecret};
use crate::hash::sha3_256_concat;
use crate::keys::EphemeralSecret;
use crate::point::decode_point;

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Symmetric key for one payment's payload.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PayloadKey([u8; SYMMETRIC_KEY_SIZE]);

impl PayloadKey {
    /// Derives `K = SHA3-256(S || DOMAIN_ENCRYPT)`.
    pub fn from_shared_secret(shared: &SharedSecret) -> Self {
        Self(sha3_256_concat(&[shared.as_bytes().as_slice(), DOMAIN_ENCRYPT]))
    }

    /// Sender side, from the ephemeral secret and the recipient's viewing key.
    ///
    /// # Errors
    /// Returns `InvalidPoint` if the viewing key is not a usable point.
    pub fn for_sender(ephemeral: &EphemeralSecret, viewing_public: &PublicKey) -> Result<Self> {
        let viewing = decode_point(viewing_public)?;
        Ok(Self::from_shared_secret(&sender_shared_secret(
            ephemeral, &viewing,
        )))
    }

    /// Recipient side, from a record's ephemeral key and the viewing secret.
    pub fn for_recipient(
        ephemeral_public_key: &PublicKey,
        viewing_private: &SecretKey,
    ) -> Result<Self> {
        Ok(Self::from_shared_secret(&recipient_shared_secret(
            ephemeral_public_key,
            viewing_private,
        )?))
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| ClawError::InvalidFormat(format!("payload key: {}", e)))
    }

    /// Seals arbitrary bytes under a fresh nonce.
    pub fn seal<R: RngCore + CryptoRng>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rng.try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| ClawError::RandomnessFailure(e.to_string()))?;

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| ClawError::InvalidFormat("plaintext too long to seal".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Opens a sealed field.
    ///
    /// # Errors
    /// - `InvalidFormat` if the input is shorter than nonce + tag
    /// - `AuthenticationFailure` if the tag does not verify
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < MIN_SEALED_SIZE {
            return Err(ClawError::InvalidFormat(format!(
                "sealed field must be at least {} bytes, got {}",
                MIN_SEALED_SIZE,
                sealed.len()
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ClawError::AuthenticationFailure("payload tag mismatch".into()))
    }

    /// Seals an amount as 8 little-endian bytes.
    pub fn seal_amount<R: RngCore + CryptoRng>(&self, rng: &mut R, amount: u64) -> Result<Vec<u8>> {
        self.seal(rng, &amount.to_le_bytes())
    }

    /// Seals a memo.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the memo exceeds `MAX_MEMO_SIZE` bytes.
    pub fn seal_memo<R: RngCore + CryptoRng>(&self, rng: &mut R, memo: &str) -> Result<Vec<u8>> {
        if memo.len() > MAX_MEMO_SIZE {
            return Err(ClawError::InvalidFormat(format!(
                "memo must be at most {} bytes, got {}",
                MAX_MEMO_SIZE,
                memo.len()
            )));
        }
        self.seal(rng, memo.as_bytes())
    }

    /// Opens a sealed amount.
    pub fn open_amount(&self, sealed: &[u8]) -> Result<u64> {
        let plaintext = Zeroizing::new(self.open(sealed)?);
        let bytes: [u8; AMOUNT_SIZE] = plaintext.as_slice().try_into().map_err(|_| {
            ClawError::InvalidFormat(format!(
                "amount must be {} bytes, got {}",
                AMOUNT_SIZE,
                plaintext.len()
            ))
        })?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Opens a sealed memo.
    pub fn open_memo(&self, sealed: &[u8]) -> Result<String> {
        let plaintext = self.open(sealed)?;
        String::from_utf8(plaintext)
            .map_err(|_| ClawError::InvalidFormat("memo is not valid UTF-8".into()))
    }
}

impl std::fmt::Debug for PayloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayloadKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD
// ═══════════════════════════════════════════════════════════════════════════════

/// Encrypts an amount and optional memo for the recipient.
///
/// Consumes the ephemeral secret, ending its life after this payment.
pub fn encrypt_payload(
    amount: u64,
    memo: Option<&str>,
    ephemeral: EphemeralSecret,
    viewing_public: &PublicKey,
) -> Result<EncryptedPayload> {
    encrypt_payload_with_rng(&mut OsRng, amount, memo, ephemeral, viewing_public)
}

/// [`encrypt_payload`] with a caller-supplied nonce source.
pub fn encrypt_payload_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    amount: u64,
    memo: Option<&str>,
    ephemeral: EphemeralSecret,
    viewing_public: &PublicKey,
) -> Result<EncryptedPayload> {
    let key = PayloadKey::for_sender(&ephemeral, viewing_public)?;
    drop(ephemeral);

    Ok(EncryptedPayload {
        encrypted_amount: key.seal_amount(rng, amount)?,
        encrypted_memo: memo.map(|m| key.seal_memo(rng, m)).transpose()?,
    })
}

/// Decrypts a payload addressed to the holder of `viewing_private`.
///
/// All-or-nothing: a memo that fails to open fails the whole call. Use
/// [`open_payload`] to keep a valid amount when only the memo is damaged.
///
/// # Errors
/// - `InvalidPoint` if the ephemeral key is not a usable point
/// - `InvalidFormat` for truncated fields
/// - `AuthenticationFailure` if either tag does not verify
pub fn decrypt_payload(
    encrypted_amount: &[u8],
    encrypted_memo: Option<&[u8]>,
    ephemeral_public_key: &PublicKey,
    viewing_private: &SecretKey,
) -> Result<DecryptedPayload> {
    let opened = open_payload(
        encrypted_amount,
        encrypted_memo,
        ephemeral_public_key,
        viewing_private,
    )?;

    Ok(DecryptedPayload {
        amount: opened.amount,
        memo: opened.memo.transpose()?,
    })
}

/// A payload whose fields were opened independently.
#[derive(Debug)]
pub struct OpenedPayload {
    /// Amount in lamports
    pub amount: u64,
    /// Memo outcome, `None` if no memo was attached
    pub memo: Option<Result<String>>,
}

/// Opens the amount and the memo separately.
///
/// A memo that does not open is reported in [`OpenedPayload::memo`] and
/// does not affect the amount.
///
/// # Errors
/// Fails only if the key cannot be derived or the amount does not open.
pub fn open_payload(
    encrypted_amount: &[u8],
    encrypted_memo: Option<&[u8]>,
    ephemeral_public_key: &PublicKey,
    viewing_private: &SecretKey,
) -> Result<OpenedPayload> {
    let key = PayloadKey::for_recipient(ephemeral_public_key, viewing_private)?;

    Ok(OpenedPayload {
        amount: key.open_amount(encrypted_amount)?,
        memo: encrypted_memo.map(|m| key.open_memo(m)),
    })
}
