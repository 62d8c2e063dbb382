//! Stealth payment creation (sender side).

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use uuid::Uuid;

use claw_core::{ClawError, MetaAddress, Result, StealthAddress, TransferRecord};
use claw_crypto::point::validate_meta_address;
use claw_crypto::{derive_stealth_public, encrypt_payload_with_rng, EphemeralSecret};

/// Derives a fresh one-time address for a recipient.
///
/// Returns the public part to publish and the single-use ephemeral secret,
/// which the caller hands to [`claw_crypto::encrypt_payload`] for the same
/// payment.
///
/// # Errors
/// - `InvalidPoint` if either half of the meta-address is not a usable point
/// - `RandomnessFailure` if the OS RNG cannot be read
pub fn derive_address(meta_address: &MetaAddress) -> Result<(StealthAddress, EphemeralSecret)> {
    derive_address_with_rng(&mut OsRng, meta_address)
}

/// [`derive_address`] with a caller-supplied RNG.
pub fn derive_address_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    meta_address: &MetaAddress,
) -> Result<(StealthAddress, EphemeralSecret)> {
    let recipient = validate_meta_address(meta_address)?;
    let ephemeral = EphemeralSecret::generate_with_rng(rng)?;

    let (address, view_tag) =
        derive_stealth_public(&ephemeral, &recipient.spending, &recipient.viewing);

    Ok((
        StealthAddress::new(address, ephemeral.public_key(), view_tag),
        ephemeral,
    ))
}

/// Creates a complete transfer record: derives the address and seals the payload.
pub fn create_transfer(
    meta_address: &MetaAddress,
    amount: u64,
    memo: Option<&str>,
) -> Result<TransferRecord> {
    let mut builder = TransferBuilder::new().recipient(*meta_address).amount(amount);
    if let Some(memo) = memo {
        builder = builder.memo(memo);
    }
    builder.build()
}

/// Builder for ready-to-register transfer records.
#[derive(Default)]
pub struct TransferBuilder {
    meta_address: Option<MetaAddress>,
    amount: Option<u64>,
    memo: Option<String>,
    sender_hint: Option<String>,
    timestamp: Option<u64>,
    id: Option<Uuid>,
}

impl TransferBuilder {
    /// Creates a new transfer builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient's meta-address (required).
    pub fn recipient(mut self, meta_address: MetaAddress) -> Self {
        self.meta_address = Some(meta_address);
        self
    }

    /// Sets the amount in lamports (required).
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Attaches an encrypted memo.
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Attaches a plaintext sender hint. Anyone can read it.
    pub fn sender_hint(mut self, hint: impl Into<String>) -> Self {
        self.sender_hint = Some(hint.into());
        self
    }

    /// Sets a custom timestamp (defaults to now).
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Sets an explicit record id (defaults to a random v4 UUID).
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Builds the record using the OS RNG.
    pub fn build(self) -> Result<TransferRecord> {
        self.build_with_rng(&mut OsRng)
    }

    /// Builds the record with a caller-supplied RNG.
    pub fn build_with_rng<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<TransferRecord> {
        let meta_address = self.meta_address.ok_or_else(|| {
            ClawError::ValidationError("recipient meta-address is required".into())
        })?;
        let amount = self
            .amount
            .ok_or_else(|| ClawError::ValidationError("amount is required".into()))?;

        let (stealth, ephemeral) = derive_address_with_rng(rng, &meta_address)?;
        let payload = encrypt_payload_with_rng(
            rng,
            amount,
            self.memo.as_deref(),
            ephemeral,
            &meta_address.viewing,
        )?;

        let mut record = TransferRecord::new(&stealth, payload);
        if let Some(id) = self.id {
            record.id = id;
        }
        if let Some(ts) = self.timestamp {
            record.timestamp = ts;
        }
        record.sender_hint = self.sender_hint;

        record.validate()?;
        Ok(record)
    }
}
