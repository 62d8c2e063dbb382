//! In-memory transfer registry.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use claw_core::error::{ClawError, Result};
use claw_core::traits::TransferRegistry;
use claw_core::types::{RegisterOutcome, RegistryStats, TransferRecord};

/// In-memory transfer registry.
///
/// # Layout
///
/// - Log: records in insertion order, behind a `RwLock`
/// - Id index: id → position in the log, for lookups and duplicate detection
///
/// # Thread Safety
///
/// Writers append under the log's write lock after claiming the id in the
/// index, so two concurrent registrations of the same id insert exactly once.
/// Readers copy the log under the read lock; a scan works on that copy and
/// never observes a half-finished append.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// Records in insertion order
    log: RwLock<Vec<TransferRecord>>,
    /// Id index: record id → position in `log`
    id_index: DashMap<Uuid, usize>,
    /// Registry statistics
    stats: RwLock<RegistryStats>,
}

impl MemoryRegistry {
    /// Creates a new empty in-memory registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a registry with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            log: RwLock::new(Vec::with_capacity(capacity)),
            id_index: DashMap::with_capacity(capacity),
            stats: RwLock::new(RegistryStats::new()),
        }
    }

    /// Appends a validated record unless its id is already present.
    fn append(&self, record: TransferRecord) -> RegisterOutcome {
        let mut log = self.log.write();
        match self.id_index.entry(record.id) {
            Entry::Occupied(_) => RegisterOutcome::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(log.len());
                self.stats.write().add(&record);
                log.push(record);
                RegisterOutcome::Inserted
            }
        }
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    /// Returns a copy of every record in insertion order.
    pub fn all_records(&self) -> Vec<TransferRecord> {
        self.log.read().clone()
    }

    /// Imports records, e.g. when restoring from a file.
    ///
    /// Records whose id is already present are skipped. Returns the number
    /// of records actually inserted.
    ///
    /// # Errors
    /// Returns `InvalidRecord` naming the first record that fails validation.
    /// Records before it stay imported.
    pub fn import(&self, records: Vec<TransferRecord>) -> Result<usize> {
        let mut imported = 0;

        for record in records {
            record
                .validate()
                .map_err(|e| ClawError::InvalidRecord(format!("{}: {}", record.id, e)))?;

            if self.append(record).is_inserted() {
                imported += 1;
            }
        }

        debug!(imported, "Imported records");
        Ok(imported)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferRegistry for MemoryRegistry {
    /// Validates and appends a record.
    ///
    /// A record whose id is already registered leaves the registry unchanged.
    #[instrument(skip(self, record), fields(id = %record.id, view_tag = record.view_tag))]
    async fn register(&self, record: TransferRecord) -> Result<RegisterOutcome> {
        record.validate()?;

        let outcome = self.append(record);
        match outcome {
            RegisterOutcome::Inserted => debug!("Registered transfer"),
            RegisterOutcome::Duplicate => debug!("Duplicate transfer id ignored"),
        }

        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &Uuid) -> Result<Option<TransferRecord>> {
        let position = self.id_index.get(id).map(|entry| *entry);
        Ok(position.and_then(|pos| self.log.read().get(pos).cloned()))
    }

    async fn snapshot(&self) -> Result<Vec<TransferRecord>> {
        Ok(self.all_records())
    }

    #[instrument(skip(self))]
    async fn since(&self, since: u64) -> Result<Vec<TransferRecord>> {
        let records: Vec<TransferRecord> = self
            .log
            .read()
            .iter()
            .filter(|r| r.timestamp >= since)
            .cloned()
            .collect();

        debug!(since, count = records.len(), "Retrieved by timestamp");
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }

    async fn stats(&self) -> Result<RegistryStats> {
        Ok(MemoryRegistry::stats(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_core::constants::{POINT_SIZE, SEALED_AMOUNT_SIZE};
    use claw_core::types::{EncryptedPayload, PublicKey, StealthAddress, TransferRecordBuilder};

    fn make_test_record(view_tag: u8, timestamp: u64) -> TransferRecord {
        TransferRecordBuilder::new()
            .stealth(StealthAddress::new(
                PublicKey::from_array([0x42; POINT_SIZE]),
                PublicKey::from_array([0x43; POINT_SIZE]),
                view_tag,
            ))
            .payload(EncryptedPayload {
                encrypted_amount: vec![0xAA; SEALED_AMOUNT_SIZE],
                encrypted_memo: None,
            })
            .timestamp(timestamp)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = MemoryRegistry::new();
        let record = make_test_record(0x42, 100);

        let outcome = registry.register(record.clone()).await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Inserted);

        let retrieved = registry.get(&record.id).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let registry = MemoryRegistry::new();
        assert!(registry.get(&Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insertion_order_preserved() {
        let registry = MemoryRegistry::new();
        for ts in [30, 10, 20] {
            registry.register(make_test_record(1, ts)).await.unwrap();
        }

        let timestamps: Vec<u64> = registry
            .snapshot()
            .await
            .unwrap()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(timestamps, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_noop() {
        let registry = MemoryRegistry::new();
        let first = make_test_record(0x01, 100);

        let mut second = make_test_record(0x02, 200);
        second.id = first.id;

        assert_eq!(
            registry.register(first.clone()).await.unwrap(),
            RegisterOutcome::Inserted
        );
        assert_eq!(
            registry.register(second).await.unwrap(),
            RegisterOutcome::Duplicate
        );

        assert_eq!(registry.count().await.unwrap(), 1);
        assert_eq!(registry.get(&first.id).await.unwrap().unwrap(), first);
        assert_eq!(registry.stats().total_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_record_rejected() {
        let registry = MemoryRegistry::new();
        let mut invalid = make_test_record(0x00, 1);
        invalid.encrypted_amount.truncate(4);

        let result = registry.register(invalid).await;
        assert!(matches!(result, Err(ClawError::InvalidFormat(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_since_is_inclusive() {
        let registry = MemoryRegistry::new();
        for ts in [10, 20, 30] {
            registry.register(make_test_record(1, ts)).await.unwrap();
        }

        let ts = |records: Vec<TransferRecord>| {
            records.iter().map(|r| r.timestamp).collect::<Vec<_>>()
        };
        assert_eq!(ts(registry.since(20).await.unwrap()), vec![20, 30]);
        assert_eq!(ts(registry.since(0).await.unwrap()), vec![10, 20, 30]);
        assert!(registry.since(31).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = MemoryRegistry::new();

        registry.register(make_test_record(0x42, 5)).await.unwrap();
        registry.register(make_test_record(0x42, 9)).await.unwrap();
        registry.register(make_test_record(0x00, 7)).await.unwrap();

        let stats = TransferRegistry::stats(&registry).await.unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.view_tag_distribution[0x42], 2);
        assert_eq!(stats.view_tag_distribution[0x00], 1);
        assert_eq!(stats.earliest_timestamp, Some(5));
        assert_eq!(stats.latest_timestamp, Some(9));
    }

    #[tokio::test]
    async fn test_import_export() {
        let registry1 = MemoryRegistry::new();
        registry1.register(make_test_record(0x01, 1)).await.unwrap();
        registry1.register(make_test_record(0x02, 2)).await.unwrap();

        let records = registry1.all_records();
        assert_eq!(records.len(), 2);

        let registry2 = MemoryRegistry::new();
        assert_eq!(registry2.import(records.clone()).unwrap(), 2);
        assert_eq!(registry2.all_records(), records);

        // Re-importing the same snapshot inserts nothing
        assert_eq!(registry2.import(records).unwrap(), 0);
        assert_eq!(registry2.len(), 2);
    }

    #[tokio::test]
    async fn test_import_invalid_record() {
        let registry = MemoryRegistry::new();
        let mut bad = make_test_record(0x01, 1);
        bad.stealth_address = PublicKey::default();

        let result = registry.import(vec![make_test_record(0x02, 2), bad]);
        assert!(matches!(result, Err(ClawError::InvalidRecord(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_register() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u8 {
            let reg = registry.clone();
            tasks.spawn(async move { reg.register(make_test_record(i, i as u64)).await.unwrap() });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap(), RegisterOutcome::Inserted);
        }

        assert_eq!(registry.len(), 100);
        assert_eq!(registry.stats().total_count, 100);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_inserts_once() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let record = make_test_record(0x07, 1);
        let mut tasks = JoinSet::new();

        for _ in 0..32 {
            let reg = registry.clone();
            let rec = record.clone();
            tasks.spawn(async move { reg.register(rec).await.unwrap() });
        }

        let mut inserted = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().is_inserted() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated() {
        let registry = MemoryRegistry::new();
        registry.register(make_test_record(1, 1)).await.unwrap();

        let snapshot = registry.snapshot().await.unwrap();
        registry.register(make_test_record(2, 2)).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
