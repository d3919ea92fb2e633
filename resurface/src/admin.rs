//! Administrative operations: status summary and conversation erase.
//!
//! Read-only status never touches the detection path; erase goes through
//! [`ConversationStore::erase`](crate::store::ConversationStore::erase).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::fingerprint::{ImageFingerprintKind, PERCEPTUAL_HASH_AVAILABLE};
use crate::pipeline::Pipeline;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeStatus {
    Disabled,
    Enabled,
    /// ENABLE_JUDGE is on but no judge model is configured; matches stay silent.
    EnabledWithoutProvider,
}

impl JudgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeStatus::Disabled => "disabled (every match reminds)",
            JudgeStatus::Enabled => "enabled",
            JudgeStatus::EnabledWithoutProvider => "enabled, no provider configured",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub conversation_id: String,
    pub records: usize,
    pub with_text_fingerprint: usize,
    pub with_image: usize,
    pub perceptual_fingerprints: usize,
    pub checksum_fingerprints: usize,
    pub blocked: bool,
    pub similarity_threshold: f32,
    pub image_hash_threshold: f32,
    pub min_unique_senders: usize,
    pub retention_days: u32,
    pub cooldown_seconds: f64,
    pub embedding_enabled: bool,
    pub judge: JudgeStatus,
    pub reminder_image_present: bool,
    pub perceptual_hash_available: bool,
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversation {}", self.conversation_id)?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(f, "  with text fingerprint: {}", self.with_text_fingerprint)?;
        writeln!(f, "  with image: {}", self.with_image)?;
        writeln!(
            f,
            "  image fingerprints: {} perceptual, {} checksum",
            self.perceptual_fingerprints, self.checksum_fingerprints
        )?;
        writeln!(f, "Blocked: {}", yes_no(self.blocked))?;
        writeln!(
            f,
            "Thresholds: text {:.2}, image {:.2}, min senders {}",
            self.similarity_threshold, self.image_hash_threshold, self.min_unique_senders
        )?;
        writeln!(
            f,
            "Retention: {} days, cooldown: {:.0}s",
            self.retention_days, self.cooldown_seconds
        )?;
        writeln!(f, "Embedding: {}", yes_no(self.embedding_enabled))?;
        writeln!(f, "Judge: {}", self.judge.as_str())?;
        writeln!(f, "Reminder image: {}", yes_no(self.reminder_image_present))?;
        write!(
            f,
            "Perceptual hashing: {}",
            if self.perceptual_hash_available {
                "available"
            } else {
                "unavailable (checksum fallback)"
            }
        )
    }
}

/// Admin entry points over a running pipeline.
#[derive(Clone)]
pub struct Admin {
    pipeline: Arc<Pipeline>,
    reminder_image_path: PathBuf,
}

impl Admin {
    pub fn new(pipeline: Arc<Pipeline>, reminder_image_path: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            reminder_image_path: reminder_image_path.into(),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.pipeline.config().is_admin(user_id)
    }

    #[instrument(skip(self))]
    pub async fn status(&self, conversation_id: &str) -> StatusReport {
        let records = self.pipeline.store().load(conversation_id).await;
        let cfg = self.pipeline.config();

        let count_kind = |kind: ImageFingerprintKind| {
            records
                .iter()
                .filter(|r| r.image_fingerprint.as_ref().is_some_and(|fp| fp.kind == kind))
                .count()
        };
        let judge = if !cfg.enable_judge {
            JudgeStatus::Disabled
        } else if self.pipeline.has_judge() {
            JudgeStatus::Enabled
        } else {
            JudgeStatus::EnabledWithoutProvider
        };

        StatusReport {
            conversation_id: conversation_id.to_string(),
            records: records.len(),
            with_text_fingerprint: records.iter().filter(|r| r.text_fingerprint.is_some()).count(),
            with_image: records.iter().filter(|r| r.has_image).count(),
            perceptual_fingerprints: count_kind(ImageFingerprintKind::Perceptual),
            checksum_fingerprints: count_kind(ImageFingerprintKind::Checksum),
            blocked: cfg.is_blocked(conversation_id),
            similarity_threshold: cfg.similarity_threshold,
            image_hash_threshold: cfg.image_hash_threshold,
            min_unique_senders: cfg.min_unique_senders,
            retention_days: cfg.retention_days,
            cooldown_seconds: cfg.cooldown_seconds,
            embedding_enabled: self.pipeline.has_embedder(),
            judge,
            reminder_image_present: tokio::fs::try_exists(&self.reminder_image_path)
                .await
                .unwrap_or(false),
            perceptual_hash_available: PERCEPTUAL_HASH_AVAILABLE,
        }
    }

    /// Erases the conversation's records and cached images. Irreversible.
    #[instrument(skip(self))]
    pub async fn erase(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.pipeline.store().erase(conversation_id).await?;
        if let Some(cache) = self.pipeline.image_cache() {
            cache.remove_conversation(conversation_id).await?;
        }
        info!(conversation_id = %conversation_id, "step: conversation memory erased");
        Ok(())
    }
}
