//! Day partitions: one zstd-compressed JSON array of records per (conversation, UTC day).
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<conversation>/2024-03-01.json.zst
//! <root>/<conversation>/2024-03-01.json.zst.tmp   (only while a write is in flight)
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::StoreError;
use crate::record::Record;

pub const PARTITION_EXT: &str = ".json.zst";
pub const UNCOMPRESSED_EXT: &str = ".json";
pub const GZIP_EXT: &str = ".json.gz";
pub const TEMP_EXT: &str = ".tmp";
const DATE_FORMAT: &str = "%Y-%m-%d";
const ZSTD_LEVEL: i32 = 3;

/// Directory-safe form of a conversation id.
pub fn sanitize_conversation_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

pub fn conversation_dir(root: &Path, conversation_id: &str) -> PathBuf {
    root.join(sanitize_conversation_id(conversation_id))
}

pub fn partition_path(dir: &Path, day: NaiveDate) -> PathBuf {
    dir.join(format!("{}{}", day.format(DATE_FORMAT), PARTITION_EXT))
}

/// Day encoded in a partition file name, if the name is `YYYY-MM-DD<ext>`.
pub fn parse_partition_day(file_name: &str, ext: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(ext)?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

pub fn encode_records<'a, I>(records: I) -> Result<Vec<u8>, StoreError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let json = serde_json::to_vec(&records)?;
    Ok(zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?)
}

pub fn decode_records(bytes: &[u8]) -> Result<Vec<Record>, StoreError> {
    let json = zstd::decode_all(bytes)?;
    let records: Vec<Record> = serde_json::from_slice(&json)?;
    Ok(records.into_iter().map(Record::normalized).collect())
}

/// Reads one compressed partition.
pub async fn read_partition(path: &Path) -> Result<Vec<Record>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    decode_records(&bytes)
}

/// Reads an uncompressed legacy JSON array of records.
pub async fn read_uncompressed(path: &Path) -> Result<Vec<Record>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    let records: Vec<Record> = serde_json::from_slice(&bytes)?;
    Ok(records.into_iter().map(Record::normalized).collect())
}

/// Reads a gzip-compressed JSON array of records.
pub async fn read_gzip(path: &Path) -> Result<Vec<Record>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    let mut json = Vec::new();
    flate2::read::GzDecoder::new(bytes.as_slice()).read_to_end(&mut json)?;
    let records: Vec<Record> = serde_json::from_slice(&json)?;
    Ok(records.into_iter().map(Record::normalized).collect())
}

/// Replaces the partition at `path` with `records`: write `<path>.tmp`, then rename over `path`.
/// On failure the temp file is removed and the previous partition is untouched.
pub async fn write_partition<'a, I>(path: &Path, records: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let count = records.len();
    let bytes = encode_records(records)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TEMP_EXT);
    let tmp = PathBuf::from(tmp);

    let result = async {
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(rm) = tokio::fs::remove_file(&tmp).await {
            if rm.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %rm, path = %tmp.display(), "Failed to remove partition temp file");
            }
        }
        return Err(e.into());
    }

    debug!(path = %path.display(), records = count, bytes = bytes.len(), "step: partition written");
    Ok(count)
}
