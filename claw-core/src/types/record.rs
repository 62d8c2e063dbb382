//! Transfer records for the CLAW registry.
//!
//! A transfer record is published by the sender alongside the on-chain
//! payment. It carries everything the recipient needs to find the payment
//! and open its amount and memo; nothing in it links back to the recipient's
//! meta-address.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PublicKey, StealthAddress};
use crate::constants::{
    LAMPORTS_PER_SOL, MAX_CLOCK_SKEW_SECS, MAX_MEMO_SIZE, MAX_SENDER_HINT_LEN, MIN_SEALED_SIZE,
    SEALED_AMOUNT_SIZE, VIEW_TAG_SPACE,
};
use crate::error::{ClawError, Result};

/// Returns the current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOADS
// ═══════════════════════════════════════════════════════════════════════════════

/// Sealed amount and memo, each `nonce || ciphertext || tag`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Sealed 8-byte little-endian amount
    #[serde(with = "hex")]
    pub encrypted_amount: Vec<u8>,
    /// Sealed UTF-8 memo, if one was attached
    #[serde(default, with = "opt_hex", skip_serializing_if = "Option::is_none")]
    pub encrypted_memo: Option<Vec<u8>>,
}

/// Plaintext recovered from an [`EncryptedPayload`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedPayload {
    /// Amount in the smallest currency unit (lamports)
    pub amount: u64,
    /// Memo text, if one was attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl DecryptedPayload {
    /// Amount expressed in SOL, for display only.
    pub fn amount_sol(&self) -> f64 {
        self.amount as f64 / LAMPORTS_PER_SOL as f64
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFER RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// An entry in the transfer registry.
///
/// Immutable once registered. Binary fields serialize as lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Unique identifier chosen by the sender
    pub id: Uuid,
    /// One-time address the payment was sent to
    pub stealth_address: PublicKey,
    /// Sender's ephemeral public key
    pub ephemeral_public_key: PublicKey,
    /// View tag for cheap filtering
    pub view_tag: u8,
    /// Sealed amount
    #[serde(with = "hex")]
    pub encrypted_amount: Vec<u8>,
    /// Sealed memo
    #[serde(default, with = "opt_hex", skip_serializing_if = "Option::is_none")]
    pub encrypted_memo: Option<Vec<u8>>,
    /// Free-form label the sender chose to attach (not authenticated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_hint: Option<String>,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
}

impl TransferRecord {
    /// Creates a record for a freshly derived address and sealed payload.
    ///
    /// Assigns a random id and the current timestamp.
    pub fn new(stealth: &StealthAddress, payload: EncryptedPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            stealth_address: stealth.address,
            ephemeral_public_key: stealth.ephemeral_public_key,
            view_tag: stealth.view_tag,
            encrypted_amount: payload.encrypted_amount,
            encrypted_memo: payload.encrypted_memo,
            sender_hint: None,
            timestamp: current_timestamp(),
        }
    }

    /// Returns the one-time address part of the record.
    pub fn stealth(&self) -> StealthAddress {
        StealthAddress::new(self.stealth_address, self.ephemeral_public_key, self.view_tag)
    }

    /// Returns the sealed payload part of the record.
    pub fn payload(&self) -> EncryptedPayload {
        EncryptedPayload {
            encrypted_amount: self.encrypted_amount.clone(),
            encrypted_memo: self.encrypted_memo.clone(),
        }
    }

    /// Validates the record structure.
    ///
    /// Checks sizes and bounds only. Whether the keys decode to curve points
    /// is left to the recipient, who treats undecodable records as not theirs.
    ///
    /// # Errors
    /// Returns `InvalidFormat` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.stealth_address.is_zero() {
            return Err(ClawError::InvalidFormat("stealth address is all zeros".into()));
        }

        if self.ephemeral_public_key.is_zero() {
            return Err(ClawError::InvalidFormat(
                "ephemeral public key is all zeros".into(),
            ));
        }

        if self.encrypted_amount.len() != SEALED_AMOUNT_SIZE {
            return Err(ClawError::InvalidFormat(format!(
                "encrypted amount must be {} bytes, got {}",
                SEALED_AMOUNT_SIZE,
                self.encrypted_amount.len()
            )));
        }

        if let Some(memo) = &self.encrypted_memo {
            if memo.len() < MIN_SEALED_SIZE || memo.len() > MIN_SEALED_SIZE + MAX_MEMO_SIZE {
                return Err(ClawError::InvalidFormat(format!(
                    "encrypted memo must be {}..={} bytes, got {}",
                    MIN_SEALED_SIZE,
                    MIN_SEALED_SIZE + MAX_MEMO_SIZE,
                    memo.len()
                )));
            }
        }

        if let Some(hint) = &self.sender_hint {
            if hint.chars().count() > MAX_SENDER_HINT_LEN {
                return Err(ClawError::InvalidFormat(format!(
                    "sender hint longer than {} characters",
                    MAX_SENDER_HINT_LEN
                )));
            }
        }

        if self.timestamp > current_timestamp() + MAX_CLOCK_SKEW_SECS {
            return Err(ClawError::InvalidFormat(
                "timestamp is too far in the future".into(),
            ));
        }

        Ok(())
    }
}

/// Builder for records assembled from parts (imports, fixtures, replays).
#[derive(Default)]
pub struct TransferRecordBuilder {
    id: Option<Uuid>,
    stealth: Option<StealthAddress>,
    payload: Option<EncryptedPayload>,
    sender_hint: Option<String>,
    timestamp: Option<u64>,
}

impl TransferRecordBuilder {
    /// Creates a new record builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit id (optional, defaults to a random v4 UUID).
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the one-time address, ephemeral key and view tag (required).
    pub fn stealth(mut self, stealth: StealthAddress) -> Self {
        self.stealth = Some(stealth);
        self
    }

    /// Sets the sealed payload (required).
    pub fn payload(mut self, payload: EncryptedPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the sender hint (optional).
    pub fn sender_hint(mut self, hint: impl Into<String>) -> Self {
        self.sender_hint = Some(hint.into());
        self
    }

    /// Sets a custom timestamp (optional, defaults to now).
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Builds and validates the record.
    pub fn build(self) -> Result<TransferRecord> {
        let stealth = self
            .stealth
            .ok_or_else(|| ClawError::ValidationError("stealth address is required".into()))?;

        let payload = self
            .payload
            .ok_or_else(|| ClawError::ValidationError("payload is required".into()))?;

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

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of registering a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterOutcome {
    /// The record was appended
    Inserted,
    /// A record with this id already exists; nothing changed
    Duplicate,
}

impl RegisterOutcome {
    /// Returns true if the record was appended.
    pub fn is_inserted(&self) -> bool {
        matches!(self, RegisterOutcome::Inserted)
    }
}

/// Statistics about records in a registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Total number of records
    pub total_count: u64,
    /// Records per view tag (for distribution analysis)
    pub view_tag_distribution: Vec<u64>,
    /// Earliest record timestamp
    pub earliest_timestamp: Option<u64>,
    /// Latest record timestamp
    pub latest_timestamp: Option<u64>,
    /// Records carrying an encrypted memo
    pub memo_count: u64,
}

impl Default for RegistryStats {
    fn default() -> Self {
        Self {
            total_count: 0,
            view_tag_distribution: vec![0; VIEW_TAG_SPACE],
            earliest_timestamp: None,
            latest_timestamp: None,
            memo_count: 0,
        }
    }
}

impl RegistryStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates stats with a new record.
    pub fn add(&mut self, record: &TransferRecord) {
        self.total_count += 1;
        self.view_tag_distribution[record.view_tag as usize] += 1;

        self.earliest_timestamp = Some(
            self.earliest_timestamp
                .map_or(record.timestamp, |t| t.min(record.timestamp)),
        );
        self.latest_timestamp = Some(
            self.latest_timestamp
                .map_or(record.timestamp, |t| t.max(record.timestamp)),
        );

        if record.encrypted_memo.is_some() {
            self.memo_count += 1;
        }
    }

    /// Number of distinct view tags that have at least one record.
    pub fn occupied_tags(&self) -> usize {
        self.view_tag_distribution.iter().filter(|&&n| n > 0).count()
    }
}

/// Hex serde for optional byte fields.
mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
