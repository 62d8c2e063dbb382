//! Payment discovery and claiming (recipient side).
//!
//! Discovery needs only the viewing secret and the spending public key.
//! Claiming additionally needs the spending secret, which produces the
//! scalar that controls the one-time address.

use serde::Serialize;
use uuid::Uuid;

use claw_core::{ClawError, PublicKey, Result, SecretKey, TransferRecord};
use claw_crypto::{
    derive_spend_scalar, is_owner, open_payload, public_from_secret, OwnershipCheck, ViewingKey,
};

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Checks one record against a loaded viewing key.
///
/// Applies the view tag filter first; only matching records pay for the
/// full address comparison.
pub fn check_record(record: &TransferRecord, key: &ViewingKey) -> OwnershipCheck {
    key.check(
        &record.stealth_address,
        &record.ephemeral_public_key,
        record.view_tag,
    )
}

/// Statistics for scanning operations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Total records scanned
    pub total_scanned: u64,
    /// Records whose view tag matched
    pub view_tag_matches: u64,
    /// Tag matches that turned out to belong to someone else
    pub false_positives: u64,
    /// Records owned by the scanning keys
    pub discoveries: u64,
    /// Records with an undecodable ephemeral key
    pub malformed: u64,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a check outcome.
    pub fn record(&mut self, check: &OwnershipCheck) {
        self.total_scanned += 1;
        match check {
            OwnershipCheck::Owned => {
                self.view_tag_matches += 1;
                self.discoveries += 1;
            }
            OwnershipCheck::FalsePositive => {
                self.view_tag_matches += 1;
                self.false_positives += 1;
            }
            OwnershipCheck::Malformed => self.malformed += 1,
            OwnershipCheck::TagMismatch => {}
        }
    }

    /// Folds another run's counters into these.
    pub fn merge(&mut self, other: &ScanStats) {
        self.total_scanned += other.total_scanned;
        self.view_tag_matches += other.view_tag_matches;
        self.false_positives += other.false_positives;
        self.discoveries += other.discoveries;
        self.malformed += other.malformed;
        self.duration_ms += other.duration_ms;
    }

    /// Returns the scan rate (records per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Returns the filter efficiency (percentage of records skipped by the view tag).
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            ((self.total_scanned - self.view_tag_matches) as f64 / self.total_scanned as f64)
                * 100.0
        }
    }

    /// Fraction of foreign records that passed the view tag filter.
    pub fn false_positive_rate(&self) -> f64 {
        let foreign = self.total_scanned - self.discoveries - self.malformed;
        if foreign == 0 {
            0.0
        } else {
            self.false_positives as f64 / foreign as f64
        }
    }
}

/// Scans records in order and returns the ones owned by these keys.
///
/// Records with `timestamp < since` are skipped; `Some(0)` is a real bound
/// and `None` disables the filter. Malformed records are skipped.
///
/// # Errors
/// Fails only if the caller's own keys are unusable.
pub fn scan_records(
    records: &[TransferRecord],
    viewing_private: &SecretKey,
    spending_public: &PublicKey,
    since: Option<u64>,
) -> Result<(Vec<TransferRecord>, ScanStats)> {
    let key = ViewingKey::new(viewing_private, spending_public)?;
    let mut stats = ScanStats::new();

    let found = records
        .iter()
        .filter(|r| since.map_or(true, |ts| r.timestamp >= ts))
        .filter(|r| {
            let check = check_record(r, &key);
            stats.record(&check);
            check.is_owned()
        })
        .cloned()
        .collect();

    Ok((found, stats))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLAIM
// ═══════════════════════════════════════════════════════════════════════════════

/// A transfer opened by its recipient.
pub struct ClaimedTransfer {
    /// Id of the claimed record
    pub record_id: Uuid,
    /// One-time address holding the funds
    pub stealth_address: PublicKey,
    /// Amount in lamports
    pub amount: u64,
    /// Memo, if one was attached and opened
    pub memo: Option<String>,
    /// Why an attached memo could not be opened
    pub memo_error: Option<ClawError>,
    /// Scalar controlling `stealth_address` (zeroized on drop)
    pub spend_scalar: SecretKey,
}

impl std::fmt::Debug for ClaimedTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimedTransfer")
            .field("record_id", &self.record_id)
            .field("stealth_address", &self.stealth_address)
            .field("amount", &self.amount)
            .field("memo", &self.memo)
            .field("memo_error", &self.memo_error)
            .field("spend_scalar", &"[REDACTED]")
            .finish()
    }
}

/// Opens a transfer and derives the key that spends it.
///
/// A memo that does not open is reported in `memo_error`; the amount and the
/// spend scalar are still returned.
///
/// # Errors
/// - `NotOwner` if the record is not addressed to these keys
/// - `AuthenticationFailure` / `InvalidFormat` if the amount does not open
pub fn claim(
    record: &TransferRecord,
    viewing_private: &SecretKey,
    spending_private: &SecretKey,
) -> Result<ClaimedTransfer> {
    let spending_public = public_from_secret(spending_private)?;

    if !is_owner(
        &record.stealth_address,
        &record.ephemeral_public_key,
        viewing_private,
        &spending_public,
    ) {
        return Err(ClawError::NotOwner);
    }

    let payload = open_payload(
        &record.encrypted_amount,
        record.encrypted_memo.as_deref(),
        &record.ephemeral_public_key,
        viewing_private,
    )?;
    let spend_scalar =
        derive_spend_scalar(&record.ephemeral_public_key, viewing_private, spending_private)?;

    let (memo, memo_error) = match payload.memo {
        Some(Ok(memo)) => (Some(memo), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    Ok(ClaimedTransfer {
        record_id: record.id,
        stealth_address: record.stealth_address,
        amount: payload.amount,
        memo,
        memo_error,
        spend_scalar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{generate_identity, generate_identity_with_rng};
    use crate::payment::{create_transfer, TransferBuilder};
    use claw_core::constants::LAMPORTS_PER_SOL;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_check_record_discovery() {
        let identity = generate_identity().unwrap();
        let record = create_transfer(&identity.meta_address(), 1, None).unwrap();
        let key = ViewingKey::new(&identity.viewing.secret, &identity.spending.public).unwrap();

        assert_eq!(check_record(&record, &key), OwnershipCheck::Owned);
    }

    #[test]
    fn test_check_record_not_for_us() {
        let alice = generate_identity().unwrap();
        let bob = generate_identity().unwrap();
        let record = create_transfer(&alice.meta_address(), 1, None).unwrap();
        let key = ViewingKey::new(&bob.viewing.secret, &bob.spending.public).unwrap();

        assert!(!check_record(&record, &key).is_owned());
    }

    #[test]
    fn test_scan_records_finds_only_own() {
        let alice = generate_identity().unwrap();
        let bob = generate_identity().unwrap();

        let records: Vec<TransferRecord> = (0..10u64)
            .map(|i| {
                let to = if i % 3 == 0 { &alice } else { &bob };
                create_transfer(&to.meta_address(), i, None).unwrap()
            })
            .collect();

        let (found, stats) =
            scan_records(&records, &alice.viewing.secret, &alice.spending.public, None).unwrap();

        let amounts: Vec<u64> = found
            .iter()
            .map(|r| claim(r, &alice.viewing.secret, &alice.spending.secret).unwrap().amount)
            .collect();
        assert_eq!(amounts, vec![0, 3, 6, 9]);
        assert_eq!(stats.total_scanned, 10);
        assert_eq!(stats.discoveries, 4);
    }

    #[test]
    fn test_scan_since_boundary() {
        let identity = generate_identity().unwrap();
        let records: Vec<TransferRecord> = [10u64, 20, 30]
            .iter()
            .map(|&ts| {
                TransferBuilder::new()
                    .recipient(identity.meta_address())
                    .amount(ts)
                    .timestamp(ts)
                    .build()
                    .unwrap()
            })
            .collect();

        let scan = |since| {
            scan_records(&records, &identity.viewing.secret, &identity.spending.public, since)
                .unwrap()
                .0
                .iter()
                .map(|r| r.timestamp)
                .collect::<Vec<_>>()
        };

        assert_eq!(scan(Some(20)), vec![20, 30]);
        assert_eq!(scan(Some(0)), vec![10, 20, 30]);
        assert_eq!(scan(None), vec![10, 20, 30]);
        assert_eq!(scan(Some(31)), Vec::<u64>::new());
    }

    #[test]
    fn test_scan_skips_malformed() {
        let identity = generate_identity().unwrap();
        let good = create_transfer(&identity.meta_address(), 7, None).unwrap();
        let mut bad = good.clone();
        bad.ephemeral_public_key = PublicKey::default();

        let (found, stats) = scan_records(
            &[bad, good.clone()],
            &identity.viewing.secret,
            &identity.spending.public,
            None,
        )
        .unwrap();

        assert_eq!(found, vec![good]);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn test_view_tag_false_positive_rate() {
        let mut rng = ChaCha20Rng::seed_from_u64(0xC1A7);
        let me = generate_identity_with_rng(&mut rng).unwrap();
        let stranger = generate_identity_with_rng(&mut rng).unwrap();

        let records: Vec<TransferRecord> = (0..2048)
            .map(|_| {
                TransferBuilder::new()
                    .recipient(stranger.meta_address())
                    .amount(1)
                    .build_with_rng(&mut rng)
                    .unwrap()
            })
            .collect();

        let (found, stats) =
            scan_records(&records, &me.viewing.secret, &me.spending.public, None).unwrap();

        // 2048 / 256 = 8 expected tag collisions
        assert!(found.is_empty());
        assert_eq!(stats.discoveries, 0);
        assert_eq!(stats.false_positives, stats.view_tag_matches);
        assert!(
            (1..=24).contains(&stats.false_positives),
            "false positives = {}",
            stats.false_positives
        );
        assert!(stats.filter_efficiency() > 98.0);
    }

    #[test]
    fn test_claim_scenario_point_one_sol() {
        let recipient = generate_identity().unwrap();
        let amount = LAMPORTS_PER_SOL / 10;

        let record = TransferBuilder::new()
            .recipient(recipient.meta_address())
            .amount(amount)
            .memo("first payment")
            .build()
            .unwrap();

        let claimed = claim(&record, &recipient.viewing.secret, &recipient.spending.secret).unwrap();

        assert_eq!(claimed.amount, 100_000_000);
        assert_eq!(claimed.memo.as_deref(), Some("first payment"));
        assert!(claimed.memo_error.is_none());
        assert_eq!(claimed.record_id, record.id);
        assert_eq!(
            public_from_secret(&claimed.spend_scalar).unwrap(),
            record.stealth_address
        );
        assert!(format!("{:?}", claimed).contains("REDACTED"));
    }

    #[test]
    fn test_claim_foreign_record() {
        let alice = generate_identity().unwrap();
        let bob = generate_identity().unwrap();
        let record = create_transfer(&alice.meta_address(), 1, None).unwrap();

        let result = claim(&record, &bob.viewing.secret, &bob.spending.secret);
        assert!(matches!(result, Err(ClawError::NotOwner)));
    }

    #[test]
    fn test_claim_tampered_amount() {
        let identity = generate_identity().unwrap();
        let mut record = create_transfer(&identity.meta_address(), 1, None).unwrap();
        record.encrypted_amount[20] ^= 0x01;

        let result = claim(&record, &identity.viewing.secret, &identity.spending.secret);
        assert!(matches!(result, Err(ClawError::AuthenticationFailure(_))));
    }

    #[test]
    fn test_claim_survives_corrupt_memo() {
        let identity = generate_identity().unwrap();
        let mut record = TransferBuilder::new()
            .recipient(identity.meta_address())
            .amount(LAMPORTS_PER_SOL / 10)
            .memo("first payment")
            .build()
            .unwrap();
        let memo = record.encrypted_memo.as_mut().unwrap();
        let last = memo.len() - 1;
        memo[last] ^= 0x01;

        let claimed = claim(&record, &identity.viewing.secret, &identity.spending.secret).unwrap();

        assert_eq!(claimed.amount, 100_000_000);
        assert!(claimed.memo.is_none());
        assert!(matches!(
            claimed.memo_error,
            Some(ClawError::AuthenticationFailure(_))
        ));
        assert_eq!(
            public_from_secret(&claimed.spend_scalar).unwrap(),
            record.stealth_address
        );
    }

    #[test]
    fn test_scan_stats_rates() {
        let mut stats = ScanStats::new();
        for _ in 0..254 {
            stats.record(&OwnershipCheck::TagMismatch);
        }
        stats.record(&OwnershipCheck::FalsePositive);
        stats.record(&OwnershipCheck::Owned);
        stats.duration_ms = 128;

        assert_eq!(stats.total_scanned, 256);
        assert_eq!(stats.view_tag_matches, 2);
        assert!((stats.rate() - 2000.0).abs() < 1e-9);
        assert!((stats.false_positive_rate() - 1.0 / 255.0).abs() < 1e-9);
    }
}
