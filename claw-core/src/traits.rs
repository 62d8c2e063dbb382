//! Common traits for CLAW.
//!
//! The registry interface lives here so the scanner and the CLI can work
//! against any storage backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{RegisterOutcome, RegistryStats, TransferRecord};

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Append-only store of transfer records.
///
/// Implementations must preserve insertion order and treat a repeated id as
/// a no-op: the first record registered under an id is the one every reader
/// sees.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - A JSON file on disk
/// - An indexer over on-chain program logs
#[async_trait]
pub trait TransferRegistry: Send + Sync {
    /// Validates and appends a record.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the record fails structural validation.
    async fn register(&self, record: TransferRecord) -> Result<RegisterOutcome>;

    /// Retrieves a record by id.
    async fn get(&self, id: &Uuid) -> Result<Option<TransferRecord>>;

    /// Returns a copy of every record in insertion order.
    ///
    /// Records registered after the call returns are not included.
    async fn snapshot(&self) -> Result<Vec<TransferRecord>>;

    /// Returns records with `timestamp >= since`, in insertion order.
    async fn since(&self, since: u64) -> Result<Vec<TransferRecord>> {
        Ok(self
            .snapshot()
            .await?
            .into_iter()
            .filter(|r| r.timestamp >= since)
            .collect())
    }

    /// Returns total record count.
    async fn count(&self) -> Result<u64>;

    /// Returns distribution statistics.
    async fn stats(&self) -> Result<RegistryStats>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN PROGRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Progress update during scanning.
#[derive(Clone, Debug, Default)]
pub struct ScanProgress {
    /// Records in the snapshot being scanned
    pub total: u64,
    /// Records scanned so far
    pub scanned: u64,
    /// Records that matched the view tag
    pub tag_matches: u64,
    /// Discoveries found so far
    pub discoveries: u64,
}

impl ScanProgress {
    /// Completion percentage (100 for an empty snapshot).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.scanned as f64 / self.total as f64 * 100.0
        }
    }
}

/// Callback for scan progress updates.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;
