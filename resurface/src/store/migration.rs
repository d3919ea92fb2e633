//! One-time conversions of older on-disk layouts into day partitions.
//!
//! - `<root>/<conversation>_messages.json`: one JSON array for the whole conversation. Split by
//!   day into partitions, then renamed to `.bak`.
//! - `<root>/<conversation>/YYYY-MM-DD.json` (uncompressed) and `YYYY-MM-DD.json.gz` (gzip): older
//!   partition formats. Their records are merged into the zstd partitions of their UTC days, then
//!   the file is renamed to `<name>.bak`. Gzip partitions were named by local date, so a file can
//!   feed two UTC days.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, info};

use super::partition::{
    conversation_dir, parse_partition_day, partition_path, read_gzip, read_partition,
    read_uncompressed, sanitize_conversation_id, write_partition, GZIP_EXT, UNCOMPRESSED_EXT,
};
use super::StoreError;
use crate::clock::utc_day;
use crate::record::Record;

const BACKUP_EXT: &str = ".bak";

pub fn legacy_file_path(root: &Path, conversation_id: &str) -> PathBuf {
    root.join(format!(
        "{}_messages.json",
        sanitize_conversation_id(conversation_id)
    ))
}

fn backup_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(BACKUP_EXT);
    PathBuf::from(s)
}

/// Groups records by UTC day, keeping their order within each day.
pub fn group_by_day<'a, I>(records: I) -> BTreeMap<NaiveDate, Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouped: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for r in records {
        grouped.entry(utc_day(r.timestamp)).or_default().push(r);
    }
    grouped
}

/// Merges `incoming` into whatever the day partition already holds (by record id).
async fn merge_into_partition(path: &Path, incoming: Vec<&Record>) -> Result<usize, StoreError> {
    let mut existing = if path.exists() {
        read_partition(path).await?
    } else {
        Vec::new()
    };
    for r in incoming {
        if !existing.iter().any(|e| e.id == r.id) {
            existing.push(r.clone());
        }
    }
    existing.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    write_partition(path, &existing).await
}

/// Converts the single-file layout if present. Returns the number of records migrated.
pub async fn migrate_legacy_file(root: &Path, conversation_id: &str) -> Result<usize, StoreError> {
    let legacy = legacy_file_path(root, conversation_id);
    if !legacy.exists() {
        return Ok(0);
    }
    info!(
        conversation_id = %conversation_id,
        path = %legacy.display(),
        "step: migrating single-file history to day partitions"
    );

    let records = read_uncompressed(&legacy).await?;
    let dir = conversation_dir(root, conversation_id);
    for (day, day_records) in group_by_day(&records) {
        merge_into_partition(&partition_path(&dir, day), day_records).await?;
    }
    tokio::fs::rename(&legacy, backup_path(&legacy)).await?;

    info!(
        conversation_id = %conversation_id,
        records = records.len(),
        "step: single-file migration done, original kept as .bak"
    );
    Ok(records.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyPartition {
    Uncompressed,
    Gzip,
}

impl LegacyPartition {
    fn of(file_name: &str) -> Option<Self> {
        if parse_partition_day(file_name, GZIP_EXT).is_some() {
            Some(Self::Gzip)
        } else if parse_partition_day(file_name, UNCOMPRESSED_EXT).is_some() {
            Some(Self::Uncompressed)
        } else {
            None
        }
    }

    async fn read(self, path: &Path) -> Result<Vec<Record>, StoreError> {
        match self {
            Self::Uncompressed => read_uncompressed(path).await,
            Self::Gzip => read_gzip(path).await,
        }
    }
}

/// Converts every uncompressed or gzip day partition in `dir` into zstd partitions.
/// Returns the number of files converted; failures are logged per file and leave it in place.
pub async fn convert_legacy_partitions(dir: &Path) -> usize {
    let mut converted = 0;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(_) => return 0,
    };
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, dir = %dir.display(), "Failed to list conversation directory");
                break;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(format) = LegacyPartition::of(&name) else {
            continue;
        };
        let source = entry.path();
        let result = async {
            let records = format.read(&source).await?;
            for (day, day_records) in group_by_day(&records) {
                merge_into_partition(&partition_path(dir, day), day_records).await?;
            }
            tokio::fs::rename(&source, backup_path(&source)).await?;
            Ok::<_, StoreError>(records.len())
        }
        .await;
        match result {
            Ok(records) => {
                converted += 1;
                info!(
                    path = %source.display(),
                    format = ?format,
                    records,
                    "step: legacy partition converted"
                );
            }
            Err(e) => error!(error = %e, path = %source.display(), "Failed to convert legacy partition"),
        }
    }
    converted
}
