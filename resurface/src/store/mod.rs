//! # Conversation store
//!
//! Per-conversation rolling record log: an in-process cache in front of day partitions on disk.
//!
//! - [`ConversationStore::lock`] gives exclusive access to one conversation's working set,
//!   loading it from disk on first use and evicting expired records on the first access of a
//!   new UTC day.
//! - [`ConversationGuard::append`] adds a record and persists that day's partition when the
//!   day's count becomes 1 or a multiple of [`APPEND_BATCH_SIZE`].
//! - [`ConversationStore::flush`] / [`ConversationStore::flush_all`] persist everything cached.
//! - [`ConversationStore::erase`] drops the cache entry and the conversation's partitions.
//!
//! Partition read/write failures are logged and skipped; they never abort a load or an append.

mod image_cache;
mod migration;
mod partition;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};

use crate::clock::{utc_day, Clock, SECONDS_PER_DAY};
use crate::record::Record;

pub use image_cache::ImageCache;
pub use migration::{group_by_day, legacy_file_path};
pub use partition::{
    conversation_dir, partition_path, sanitize_conversation_id, PARTITION_EXT,
};

/// A day partition is rewritten when that day's record count reaches a multiple of this.
pub const APPEND_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cached working set of one conversation.
#[derive(Debug, Default)]
pub struct CacheEntry {
    /// Ascending by timestamp.
    pub records: Vec<Arc<Record>>,
    /// When the entry was loaded or last cleaned of expired records.
    pub last_load: f64,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

pub struct ConversationStore {
    root: PathBuf,
    retention_days: u32,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ConversationStore {
    pub fn new(root: impl Into<PathBuf>, retention_days: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            retention_days,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Oldest timestamp still inside the retention horizon at `now`.
    pub fn cutoff(&self, now: f64) -> f64 {
        now - f64::from(self.retention_days) * SECONDS_PER_DAY
    }

    async fn slot(&self, conversation_id: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(conversation_id.to_string()).or_default().clone()
    }

    async fn existing_slot(&self, conversation_id: &str) -> Option<Slot> {
        self.slots.lock().await.get(conversation_id).cloned()
    }

    /// Exclusive access to a conversation's working set, loading or cleaning it first.
    ///
    /// Holding the guard serializes all store mutation for that conversation.
    pub async fn lock(&self, conversation_id: &str) -> ConversationGuard<'_> {
        let slot = self.slot(conversation_id).await;
        let mut guard = slot.lock_owned().await;
        let now = self.clock.now();

        if guard.is_none() {
            *guard = Some(self.load_from_disk(conversation_id, now).await);
        } else if let Some(entry) = guard.as_mut() {
            if utc_day(entry.last_load) != utc_day(now) {
                let cutoff = self.cutoff(now);
                let before = entry.records.len();
                entry.records.retain(|r| r.timestamp >= cutoff);
                entry.last_load = now;
                info!(
                    conversation_id = %conversation_id,
                    evicted = before - entry.records.len(),
                    kept = entry.records.len(),
                    "step: day rollover, expired records evicted"
                );
            }
        }

        ConversationGuard {
            store: self,
            conversation_id: conversation_id.to_string(),
            entry: guard,
        }
    }

    /// Snapshot of the conversation's working set.
    pub async fn load(&self, conversation_id: &str) -> Vec<Arc<Record>> {
        self.lock(conversation_id).await.records().to_vec()
    }

    /// Appends `record` to the conversation (see [`ConversationGuard::append`]).
    pub async fn append(&self, conversation_id: &str, record: Record) {
        self.lock(conversation_id).await.append(record).await;
    }

    /// Writes every cached record of the conversation to its day partition.
    /// Returns the number of partitions written; nothing cached means 0.
    pub async fn flush(&self, conversation_id: &str) -> usize {
        let Some(slot) = self.existing_slot(conversation_id).await else {
            return 0;
        };
        let guard = slot.lock().await;
        match guard.as_ref() {
            Some(entry) => self.write_all_days(conversation_id, entry).await,
            None => 0,
        }
    }

    /// Flushes every cached conversation.
    pub async fn flush_all(&self) -> usize {
        let ids: Vec<String> = self.slots.lock().await.keys().cloned().collect();
        let mut written = 0;
        for id in ids {
            written += self.flush(&id).await;
        }
        info!(partitions = written, "step: all conversations flushed");
        written
    }

    /// Drops the cached entry and deletes the conversation's partitions and legacy files.
    #[instrument(skip(self))]
    pub async fn erase(&self, conversation_id: &str) -> Result<(), StoreError> {
        let slot = self.slot(conversation_id).await;
        let mut guard = slot.lock().await;
        *guard = None;

        let dir = conversation_dir(&self.root, conversation_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let legacy = legacy_file_path(&self.root, conversation_id);
        for path in [legacy.clone(), legacy.with_extension("json.bak")] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(conversation_id = %conversation_id, "step: conversation erased");
        Ok(())
    }

    async fn write_all_days(&self, conversation_id: &str, entry: &CacheEntry) -> usize {
        if entry.records.is_empty() {
            return 0;
        }
        let dir = conversation_dir(&self.root, conversation_id);
        let mut written = 0;
        for (day, records) in group_by_day(entry.records.iter().map(|r| r.as_ref())) {
            let path = partition_path(&dir, day);
            match partition::write_partition(&path, records).await {
                Ok(_) => written += 1,
                Err(e) => error!(error = %e, path = %path.display(), "Partition write failed"),
            }
        }
        debug!(
            conversation_id = %conversation_id,
            records = entry.records.len(),
            partitions = written,
            "step: conversation flushed"
        );
        written
    }

    /// Reads all partitions inside the retention horizon, migrating older layouts first.
    #[instrument(skip(self, now))]
    async fn load_from_disk(&self, conversation_id: &str, now: f64) -> CacheEntry {
        if let Err(e) = migration::migrate_legacy_file(&self.root, conversation_id).await {
            error!(error = %e, conversation_id = %conversation_id, "Legacy history migration failed");
        }

        let dir = conversation_dir(&self.root, conversation_id);
        migration::convert_legacy_partitions(&dir).await;

        let cutoff = self.cutoff(now);
        let (first_day, last_day) = (utc_day(cutoff), utc_day(now));
        let mut records = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&dir).await {
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, dir = %dir.display(), "Failed to list partitions");
                        break;
                    }
                };
                let name = entry.file_name().to_string_lossy().into_owned();
                let Some(day) = partition::parse_partition_day(&name, PARTITION_EXT) else {
                    continue;
                };
                if day < first_day || day > last_day {
                    continue;
                }
                match partition::read_partition(&entry.path()).await {
                    Ok(day_records) => records.extend(day_records),
                    Err(e) => warn!(error = %e, file = %name, "Unreadable partition skipped"),
                }
            }
        }

        records.retain(|r: &Record| r.timestamp >= cutoff);
        records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        info!(
            conversation_id = %conversation_id,
            records = records.len(),
            "step: conversation loaded from disk"
        );

        CacheEntry {
            records: records.into_iter().map(Arc::new).collect(),
            last_load: now,
        }
    }
}

/// Exclusive handle on one conversation's cached working set.
pub struct ConversationGuard<'a> {
    store: &'a ConversationStore,
    conversation_id: String,
    entry: OwnedMutexGuard<Option<CacheEntry>>,
}

impl ConversationGuard<'_> {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Records in ascending timestamp order.
    pub fn records(&self) -> &[Arc<Record>] {
        self.entry
            .as_ref()
            .map(|e| e.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Adds `record` after every record with a timestamp not later than its own, so the working
    /// set stays ascending. Persists its day partition when that day's count becomes 1 or a
    /// multiple of [`APPEND_BATCH_SIZE`].
    pub async fn append(&mut self, record: Record) {
        let now = self.store.clock.now();
        let entry = self.entry.get_or_insert_with(|| CacheEntry {
            records: Vec::new(),
            last_load: now,
        });
        let day = utc_day(record.timestamp);
        let at = entry
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        entry.records.insert(at, Arc::new(record.normalized()));

        let day_records: Vec<&Record> = entry
            .records
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| utc_day(r.timestamp) == day)
            .collect();
        let count = day_records.len();
        if count != 1 && count % APPEND_BATCH_SIZE != 0 {
            return;
        }

        let path = partition_path(
            &conversation_dir(&self.store.root, &self.conversation_id),
            day,
        );
        match partition::write_partition(&path, day_records).await {
            Ok(n) => debug!(
                conversation_id = %self.conversation_id,
                day = %day,
                records = n,
                "step: day partition persisted"
            ),
            Err(e) => error!(
                error = %e,
                conversation_id = %self.conversation_id,
                path = %path.display(),
                "Partition write failed, records stay cached"
            ),
        }
    }
}
