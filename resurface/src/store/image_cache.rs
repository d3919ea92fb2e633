//! Local copies of fetched images, one directory per conversation.
//!
//! File names encode the record timestamp (`YYYYmmdd_HHMMSS_<micros>.jpg`, UTC) so expired
//! files can be found without reading them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, warn};

use super::partition::sanitize_conversation_id;
use super::StoreError;

const NAME_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn conversation_dir(&self, conversation_id: &str) -> PathBuf {
        self.root.join(sanitize_conversation_id(conversation_id))
    }

    pub fn file_name(timestamp: f64) -> String {
        let secs = timestamp.floor() as i64;
        let micros = ((timestamp - timestamp.floor()) * 1e6) as u32;
        let stamp = DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.format(NAME_TIME_FORMAT).to_string())
            .unwrap_or_else(|| "19700101_000000".to_string());
        format!("{}_{:06}.jpg", stamp, micros)
    }

    /// Timestamp encoded in a cache file name (second precision).
    pub fn parse_file_time(name: &str) -> Option<f64> {
        let mut parts = name.splitn(3, '_');
        let date = parts.next()?;
        let time = parts.next()?;
        parts.next()?;
        let dt = NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), NAME_TIME_FORMAT).ok()?;
        Some(dt.and_utc().timestamp() as f64)
    }

    /// Stores `bytes` for a record created at `timestamp`; returns the file path.
    pub async fn save(
        &self,
        conversation_id: &str,
        timestamp: f64,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.conversation_dir(conversation_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(Self::file_name(timestamp));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "step: image cached");
        Ok(path)
    }

    /// Deletes cached images older than `cutoff`. Unparsable names are left alone.
    pub async fn cleanup(&self, conversation_id: &str, cutoff: f64) -> usize {
        let dir = self.conversation_dir(conversation_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(_) => return 0,
        };
        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(file_time) = Self::parse_file_time(&name) else {
                continue;
            };
            if file_time >= cutoff {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(error = %e, file = %name, "Failed to remove expired cached image"),
            }
        }
        if removed > 0 {
            debug!(conversation_id = %conversation_id, removed, "step: image cache cleanup");
        }
        removed
    }

    /// Removes every cached image of the conversation.
    pub async fn remove_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_dir_all(self.conversation_dir(conversation_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
