//! File-based transfer registry with persistence.
//!
//! Keeps the log in memory and writes it to a single JSON file. Suitable for
//! single-node deployments and for the CLI, where the file is the registry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use claw_core::constants::PROTOCOL_VERSION;
use claw_core::error::{ClawError, Result};
use claw_core::traits::TransferRegistry;
use claw_core::types::{RegisterOutcome, RegistryStats, TransferRecord};

use crate::MemoryRegistry;

/// File-based transfer registry.
///
/// Uses a memory registry internally with explicit or threshold-driven saves.
/// Saves are serialized; a record inserted while a save is running stays
/// dirty until the next one.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "CLAW"
/// version (1 byte): PROTOCOL_VERSION
/// count (8 bytes, LE): number of records
/// records (variable): JSON array of records
/// ```
pub struct FileRegistry {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryRegistry,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Auto-save threshold (save once this many inserts are pending; 0 disables)
    auto_save_threshold: u64,
    /// Inserts since last save
    writes_since_save: AtomicU64,
    /// Held for the whole of a save
    save_lock: Mutex<()>,
}

/// File format magic bytes
const MAGIC: &[u8; 4] = b"CLAW";
/// magic + version + count
const HEADER_SIZE: usize = 4 + 1 + 8;

impl FileRegistry {
    /// Opens the registry at `path`.
    ///
    /// If the file exists, it is loaded. Otherwise the registry starts empty
    /// and the file is created on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let registry = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryRegistry::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: 0,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if fs::try_exists(&registry.path).await? {
            registry.load().await?;
        }

        Ok(registry)
    }

    /// Opens the registry and saves automatically every `threshold` inserts.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut registry = Self::new(path).await?;
        registry.auto_save_threshold = threshold;
        Ok(registry)
    }

    /// Loads records from the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await?;

        if contents.len() < HEADER_SIZE {
            return Err(ClawError::RegistryError("file too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(ClawError::RegistryError("invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != PROTOCOL_VERSION {
            return Err(ClawError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_SIZE]);
        let count = u64::from_le_bytes(count_bytes);
        info!(count, "Loading transfer records from file");

        let records: Vec<TransferRecord> = if contents.len() > HEADER_SIZE {
            serde_json::from_slice(&contents[HEADER_SIZE..])?
        } else {
            Vec::new()
        };

        if records.len() as u64 != count {
            return Err(ClawError::RegistryError(format!(
                "header says {} records, file holds {}",
                count,
                records.len()
            )));
        }

        self.memory.import(records)?;
        self.dirty.store(false, Ordering::SeqCst);
        debug!("Registry loaded successfully");

        Ok(())
    }

    /// Saves records to the file.
    ///
    /// Writes to a temporary sibling first and renames it over the target,
    /// so a crash mid-save leaves the previous file intact.
    pub async fn save(&self) -> Result<()> {
        self.write_out(false).await
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn write_out(&self, only_if_dirty: bool) -> Result<()> {
        let _guard = self.save_lock.lock().await;

        if only_if_dirty && !self.is_dirty() {
            return Ok(());
        }

        // Cleared before the snapshot: an insert that misses the snapshot
        // marks the registry dirty again.
        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        let result = self.write_file(self.memory.all_records()).await;
        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn write_file(&self, records: Vec<TransferRecord>) -> Result<()> {
        let count = records.len() as u64;

        info!(count, "Saving registry to file");

        let serialized = serde_json::to_vec(&records)?;

        let mut contents = Vec::with_capacity(HEADER_SIZE + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(PROTOCOL_VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        debug!("Registry saved successfully");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Saves if dirty.
    pub async fn flush(&self) -> Result<()> {
        self.write_out(true).await
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory registry for direct access.
    pub fn memory(&self) -> &MemoryRegistry {
        &self.memory
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// The insert has already happened, so a failed save is logged and the
    /// registry stays dirty for the next save or flush.
    async fn maybe_auto_save(&self) {
        if self.auto_save_threshold == 0 {
            return;
        }
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst) + 1;
        if writes >= self.auto_save_threshold {
            if let Err(e) = self.write_out(true).await {
                warn!(path = ?self.path, error = %e, "Auto-save failed; changes kept in memory");
            }
        }
    }
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!(path = ?self.path, "FileRegistry dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl TransferRegistry for FileRegistry {
    async fn register(&self, record: TransferRecord) -> Result<RegisterOutcome> {
        let outcome = self.memory.register(record).await?;
        if outcome.is_inserted() {
            self.dirty.store(true, Ordering::SeqCst);
            self.maybe_auto_save().await;
        }
        Ok(outcome)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<TransferRecord>> {
        self.memory.get(id).await
    }

    async fn snapshot(&self) -> Result<Vec<TransferRecord>> {
        self.memory.snapshot().await
    }

    async fn since(&self, since: u64) -> Result<Vec<TransferRecord>> {
        self.memory.since(since).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }

    async fn stats(&self) -> Result<RegistryStats> {
        Ok(self.memory.stats())
    }
}
