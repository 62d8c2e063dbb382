//! # CLAW Scanner
//!
//! Two-phase scanning of a transfer registry to discover incoming payments.
//!
//! ## Features
//!
//! - **View Tag Filter**: One hash per record rejects ~255/256 foreign transfers
//! - **Exact Check**: Full one-time address comparison for tag matches only
//! - **Time Bounds**: Inclusive `since` / `until` filters
//! - **Progress Reporting**: Callbacks for UI progress updates
//!
//! The scanner holds only the viewing secret and the spending public key, so
//! it can run on a machine that is never trusted with spending authority.
//!
//! ## Example
//!
//! ```rust
//! use claw_core::TransferRegistry;
//! use claw_registry::MemoryRegistry;
//! use claw_scanner::Scanner;
//! use claw_stealth::{create_transfer, generate_identity};
//!
//! # #[tokio::main]
//! # async fn main() -> claw_core::Result<()> {
//! let recipient = generate_identity()?;
//! let registry = MemoryRegistry::new();
//! registry
//!     .register(create_transfer(&recipient.meta_address(), 42, None)?)
//!     .await?;
//!
//! let scanner = Scanner::new(&recipient.viewing.secret, &recipient.spending.public)?;
//! let summary = scanner.scan_all(&registry).await?;
//! assert_eq!(summary.len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use claw_core::constants::DEFAULT_PROGRESS_INTERVAL;
use claw_core::error::Result;
use claw_core::traits::{ProgressCallback, ScanProgress, TransferRegistry};
use claw_core::types::{PublicKey, SecretKey, TransferRecord};
use claw_crypto::{OwnershipCheck, ViewingKey};
use claw_stealth::discovery::{check_record, ScanStats};
use claw_stealth::ViewingKeyExport;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Minimum timestamp to scan from (inclusive); `Some(0)` is a real bound
    pub since: Option<u64>,
    /// Maximum timestamp to scan to (inclusive)
    pub until: Option<u64>,
    /// Whether to stop on first discovery
    pub stop_on_first: bool,
    /// Records between progress callbacks (0 = final report only)
    pub progress_interval: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            stop_on_first: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ScannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips records older than `timestamp`.
    pub fn since(mut self, timestamp: u64) -> Self {
        self.since = Some(timestamp);
        self
    }

    /// Skips records newer than `timestamp`.
    pub fn until(mut self, timestamp: u64) -> Self {
        self.until = Some(timestamp);
        self
    }

    /// Sets both time bounds.
    pub fn time_range(self, from: u64, to: u64) -> Self {
        self.since(from).until(to)
    }

    /// Enables stopping on first discovery.
    pub fn stop_on_first(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    /// Sets the progress callback interval.
    pub fn progress_interval(mut self, records: u64) -> Self {
        self.progress_interval = records;
        self
    }

    fn contains(&self, timestamp: u64) -> bool {
        self.since.map_or(true, |from| timestamp >= from)
            && self.until.map_or(true, |to| timestamp <= to)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of one scan.
#[derive(Clone, Debug, Serialize)]
pub struct ScanSummary {
    /// Owned records, in registry order
    pub discovered: Vec<TransferRecord>,
    /// Counters for this scan only
    pub stats: ScanStats,
}

impl ScanSummary {
    /// Number of discovered records.
    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    /// Returns true if nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

/// Registry scanner bound to one recipient's viewing credentials.
pub struct Scanner {
    key: ViewingKey,
    /// Cumulative statistics across scans
    stats: RwLock<ScanStats>,
}

impl Scanner {
    /// Creates a scanner from the viewing secret and spending public key.
    ///
    /// # Errors
    /// - `InvalidFormat` if the viewing secret is not canonical
    /// - `InvalidPoint` if the spending public key is not a usable point
    pub fn new(viewing_private: &SecretKey, spending_public: &PublicKey) -> Result<Self> {
        Ok(Self {
            key: ViewingKey::new(viewing_private, spending_public)?,
            stats: RwLock::new(ScanStats::new()),
        })
    }

    /// Creates a scanner from delegated scan-only credentials.
    pub fn from_export(export: &ViewingKeyExport) -> Result<Self> {
        let (viewing_private, spending_public) = export.decode()?;
        Self::new(&viewing_private, &spending_public)
    }

    /// Returns statistics accumulated over every scan so far.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Resets the accumulated statistics.
    pub fn reset_stats(&self) {
        *self.stats.write() = ScanStats::new();
    }

    /// Checks a single record.
    pub fn scan_one(&self, record: &TransferRecord) -> OwnershipCheck {
        let check = check_record(record, &self.key);
        self.stats.write().record(&check);
        check
    }

    /// Scans every record in the registry.
    pub async fn scan_all(&self, registry: &dyn TransferRegistry) -> Result<ScanSummary> {
        self.run(registry, &ScannerConfig::default(), None).await
    }

    /// Scans with custom configuration.
    pub async fn scan_with_config(
        &self,
        registry: &dyn TransferRegistry,
        config: ScannerConfig,
    ) -> Result<ScanSummary> {
        self.run(registry, &config, None).await
    }

    /// Scans with progress reporting.
    ///
    /// The callback fires every `config.progress_interval` records and once
    /// more at the end, unless the last periodic report already covered it.
    pub async fn scan_with_progress(
        &self,
        registry: &dyn TransferRegistry,
        config: ScannerConfig,
        progress_callback: ProgressCallback,
    ) -> Result<ScanSummary> {
        self.run(registry, &config, Some(&progress_callback)).await
    }

    #[instrument(skip_all, fields(since = ?config.since, until = ?config.until))]
    async fn run(
        &self,
        registry: &dyn TransferRegistry,
        config: &ScannerConfig,
        progress: Option<&ProgressCallback>,
    ) -> Result<ScanSummary> {
        let start = Instant::now();

        // Records registered after this point belong to the next scan
        let snapshot = match config.since {
            Some(from) => registry.since(from).await?,
            None => registry.snapshot().await?,
        };
        let records: Vec<TransferRecord> = snapshot
            .into_iter()
            .filter(|r| config.contains(r.timestamp))
            .collect();

        let total = records.len() as u64;
        debug!(total, "Scanning snapshot");

        let mut stats = ScanStats::new();
        let mut discovered = Vec::new();
        let mut last_report = None;

        for record in records {
            let check = check_record(&record, &self.key);
            stats.record(&check);

            match check {
                OwnershipCheck::Owned => {
                    debug!(id = %record.id, "Discovered transfer");
                    discovered.push(record);
                }
                OwnershipCheck::Malformed => {
                    warn!(id = %record.id, "Skipping record with undecodable ephemeral key");
                }
                OwnershipCheck::FalsePositive | OwnershipCheck::TagMismatch => {}
            }

            if config.progress_interval > 0 && stats.total_scanned % config.progress_interval == 0
            {
                report(progress, total, &stats);
                last_report = Some(stats.total_scanned);
            }

            if config.stop_on_first && !discovered.is_empty() {
                info!("Stopping on first discovery");
                break;
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        if last_report != Some(stats.total_scanned) {
            report(progress, total, &stats);
        }

        self.stats.write().merge(&stats);

        info!(
            discoveries = stats.discoveries,
            scanned = stats.total_scanned,
            tag_matches = stats.view_tag_matches,
            false_positives = stats.false_positives,
            malformed = stats.malformed,
            duration_ms = stats.duration_ms,
            rate = format!("{:.2}/s", stats.rate()),
            "Scan complete"
        );

        Ok(ScanSummary { discovered, stats })
    }
}

fn report(progress: Option<&ProgressCallback>, total: u64, stats: &ScanStats) {
    if let Some(callback) = progress {
        callback(ScanProgress {
            total,
            scanned: stats.total_scanned,
            tag_matches: stats.view_tag_matches,
            discoveries: stats.discoveries,
        });
    }
}

/// Scans a registry with a one-off scanner and returns the owned records.
///
/// `since` is inclusive; `None` scans everything.
pub async fn scan(
    registry: &dyn TransferRegistry,
    viewing_private: &SecretKey,
    spending_public: &PublicKey,
    since: Option<u64>,
) -> Result<Vec<TransferRecord>> {
    let config = ScannerConfig {
        since,
        ..ScannerConfig::default()
    };
    let scanner = Scanner::new(viewing_private, spending_public)?;
    Ok(scanner.scan_with_config(registry, config).await?.discovered)
}
