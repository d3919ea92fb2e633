//! # Decision pipeline
//!
//! Turns one incoming message into a [`Decision`]:
//!
//! extract → content filter → fingerprint → lock conversation → match → sender-count gate →
//! self-repost gate → cooldown gate → judgment gate → append → reminder.
//!
//! The new record is appended exactly once, after the decision, whatever the outcome (except
//! [`Decision::Ignored`], where there is nothing to record). The conversation lock is held from
//! snapshot through append, so one conversation's messages are decided strictly in order. The
//! record is stamped with the clock under that lock, so the working set stays in ascending
//! timestamp order even when a slow image download finishes after a later message.

mod content_filter;
mod decision;
mod extract;
mod gates;

use std::sync::Arc;

use embedding::EmbeddingService;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{
    ImageFetcher, JudgeCapability, JudgeRequest, ReminderSink, VisionCapability,
};
use crate::clock::Clock;
use crate::config::DetectorConfig;
use crate::core::Message;
use crate::fingerprint::{image_fingerprint, text_fingerprint, ImageFingerprint};
use crate::matching::{
    best_image_match, best_text_match, context_window, count_distinct_senders_image,
    count_distinct_senders_text, recent_window, ContextLine, MatchKind,
};
use crate::record::Record;
use crate::store::{ConversationStore, ImageCache};

pub use content_filter::{ContentFilter, ContentRejection};
pub use decision::{Decision, Reminder, SilentReason};
pub use extract::{extract_content, Extracted, IMAGE_PLACEHOLDER};
pub use gates::{choose_match, cooldown_gate, self_repost_gate, sender_count_gate};

/// The working set is scanned with the new record appended; it must not match itself.
const EXCLUDE_CURRENT: usize = 1;

/// Image cache cleanup runs whenever the working set length is a multiple of this.
pub const IMAGE_CLEANUP_EVERY: usize = 100;

/// The detector: configuration, store and optional capabilities.
pub struct Pipeline {
    config: DetectorConfig,
    content_filter: ContentFilter,
    store: Arc<ConversationStore>,
    clock: Arc<dyn Clock>,
    image_cache: Option<ImageCache>,
    embedder: Option<Arc<dyn EmbeddingService>>,
    vision: Option<Arc<dyn VisionCapability>>,
    judge: Option<Arc<dyn JudgeCapability>>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
    reminder: Option<Arc<dyn ReminderSink>>,
}

impl Pipeline {
    /// Pipeline with no capabilities; the clock is the store's.
    pub fn new(config: DetectorConfig, store: Arc<ConversationStore>) -> Self {
        let clock = store.clock().clone();
        Self {
            content_filter: ContentFilter::new(&config),
            config,
            store,
            clock,
            image_cache: None,
            embedder: None,
            vision: None,
            judge: None,
            fetcher: None,
            reminder: None,
        }
    }

    pub fn with_image_cache(mut self, cache: ImageCache) -> Self {
        self.image_cache = Some(cache);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingService>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionCapability>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn JudgeCapability>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_reminder(mut self, reminder: Arc<dyn ReminderSink>) -> Self {
        self.reminder = Some(reminder);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn image_cache(&self) -> Option<&ImageCache> {
        self.image_cache.as_ref()
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Runs the whole pipeline for `message`. Never fails; capability and storage trouble
    /// degrade to a silent decision.
    #[instrument(skip(self, message), fields(message_id = %message.id, chat_id = message.chat.id))]
    pub async fn process(&self, message: &Message) -> Decision {
        let Some(extracted) = extract_content(message, self.vision.as_deref()).await else {
            info!(user_id = message.user.id, "step: nothing to record, message ignored");
            return Decision::Ignored;
        };

        if let Some(rejection) = self.content_filter.check(&extracted) {
            info!(user_id = message.user.id, reason = %rejection, "step: content filtered, message ignored");
            return Decision::Ignored;
        }

        let conversation_id = message.chat.conversation_id();
        let (mut record, image_bytes) = self.build_record(message, &extracted).await;

        let mut guard = self.store.lock(&conversation_id).await;
        let now = self.clock.now();
        record.timestamp = now;
        if let Some(bytes) = image_bytes {
            record.cached_image_path = self.cache_image(&conversation_id, now, &bytes).await;
        }

        let decision = if record.has_any_fingerprint() {
            let mut snapshot = guard.records().to_vec();
            snapshot.push(Arc::new(record.clone()));
            self.decide(&record, &snapshot, now).await
        } else {
            debug!("step: no fingerprint, recording only");
            Decision::Silent(SilentReason::NoFingerprint)
        };

        if let Some(cache) = &self.image_cache {
            let len = guard.len();
            if len > 0 && len % IMAGE_CLEANUP_EVERY == 0 {
                cache
                    .cleanup(&conversation_id, self.store.cutoff(now))
                    .await;
            }
        }
        guard.append(record).await;
        drop(guard);

        match &decision {
            Decision::Remind(r) => {
                info!(
                    conversation_id = %conversation_id,
                    matched_id = %r.matched_id,
                    kind = r.kind.as_str(),
                    score = r.score,
                    unique_senders = r.unique_senders,
                    "step: resurfaced content, sending reminder"
                );
                if let Some(sink) = &self.reminder {
                    if let Err(e) = sink.remind(message).await {
                        warn!(error = %e, conversation_id = %conversation_id, "Reminder delivery failed");
                    }
                }
            }
            Decision::Silent(reason) => {
                info!(conversation_id = %conversation_id, reason = %reason, "step: recorded silently");
            }
            Decision::Ignored => {}
        }
        decision
    }

    /// Computes fingerprints for the new record; returns the downloaded image bytes alongside.
    /// The timestamp is provisional until the conversation lock is held.
    async fn build_record(
        &self,
        message: &Message,
        extracted: &Extracted,
    ) -> (Record, Option<Vec<u8>>) {
        let text_fp = if extracted.embeddable {
            text_fingerprint(self.embedder.as_deref(), &extracted.content).await
        } else {
            None
        };

        let mut record = Record::new(
            message.user.id.to_string(),
            message.user.display_name(),
            extracted.content.clone(),
            self.clock.now(),
        )
        .with_text_fingerprint(text_fp);

        let mut image_bytes = None;
        if let Some(url) = &extracted.image_url {
            let (image_fp, bytes) = self.acquire_image(url).await;
            record = record.with_image(image_fp, None);
            image_bytes = bytes;
        }
        (record, image_bytes)
    }

    /// Downloads and hashes one image. A failed download gives neither part.
    async fn acquire_image(&self, url: &str) -> (Option<ImageFingerprint>, Option<Vec<u8>>) {
        let Some(fetcher) = &self.fetcher else {
            return (None, None);
        };
        match fetcher.fetch(url).await {
            Ok(bytes) => (image_fingerprint(&bytes), Some(bytes)),
            Err(e) => {
                warn!(error = %e, "Image download failed");
                (None, None)
            }
        }
    }

    /// Saves the image under the record's final timestamp; `None` without a cache or on failure.
    async fn cache_image(&self, conversation_id: &str, timestamp: f64, bytes: &[u8]) -> Option<String> {
        let cache = self.image_cache.as_ref()?;
        match cache.save(conversation_id, timestamp, bytes).await {
            Ok(path) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                warn!(error = %e, "Image cache write failed");
                None
            }
        }
    }

    /// Match and gates over `snapshot`, whose last element is `record`.
    async fn decide(&self, record: &Record, snapshot: &[Arc<Record>], now: f64) -> Decision {
        let cfg = &self.config;

        let text_outcome = record
            .text_fingerprint
            .as_ref()
            .map(|q| best_text_match(snapshot, q, cfg.similarity_threshold, EXCLUDE_CURRENT));
        let image_outcome = record
            .image_fingerprint
            .as_ref()
            .map(|q| best_image_match(snapshot, q, cfg.image_hash_threshold, EXCLUDE_CURRENT));

        debug!(
            text_best = ?text_outcome.and_then(|o| o.best_score_seen),
            image_best = ?image_outcome.and_then(|o| o.best_score_seen),
            "step: match scan done"
        );

        let chosen = choose_match(
            text_outcome.and_then(|o| o.best),
            image_outcome.and_then(|o| o.best),
            cfg.match_precedence,
        );
        let Some(matched) = chosen else {
            let best_score = match (
                text_outcome.and_then(|o| o.best_score_seen),
                image_outcome.and_then(|o| o.best_score_seen),
            ) {
                (Some(t), Some(i)) => Some(t.max(i)),
                (t, i) => t.or(i),
            };
            return Decision::Silent(SilentReason::NoMatch { best_score });
        };

        let (unique_senders, _) = match matched.kind {
            MatchKind::Text => record
                .text_fingerprint
                .as_ref()
                .map(|q| count_distinct_senders_text(snapshot, q, cfg.similarity_threshold)),
            MatchKind::Image => record
                .image_fingerprint
                .as_ref()
                .map(|q| count_distinct_senders_image(snapshot, q, cfg.image_hash_threshold)),
        }
        .unwrap_or_default();

        info!(
            kind = matched.kind.as_str(),
            score = matched.score,
            matched_id = %matched.record.id,
            unique_senders,
            "step: match found"
        );

        if let Some(reason) = sender_count_gate(unique_senders, cfg.min_unique_senders)
            .or_else(|| self_repost_gate(&record.sender_id, &matched.record.sender_id))
            .or_else(|| cooldown_gate(now, matched.record.timestamp, cfg.cooldown_seconds))
        {
            return Decision::Silent(reason);
        }

        let reminder = |reason: Option<String>| Reminder {
            matched_id: matched.record.id.clone(),
            matched_sender_id: matched.record.sender_id.clone(),
            matched_sender_name: matched.record.sender_name.clone(),
            kind: matched.kind,
            score: matched.score,
            unique_senders,
            reason,
        };

        if !cfg.enable_judge {
            return Decision::Remind(reminder(None));
        }
        let Some(judge) = &self.judge else {
            debug!("step: judgment enabled but no judge configured");
            return Decision::Silent(SilentReason::JudgeUnavailable);
        };

        let before_current = &snapshot[..snapshot.len().saturating_sub(EXCLUDE_CURRENT)];
        let request = JudgeRequest {
            content: record.content.clone(),
            sender_name: record.sender_name.clone(),
            matched: ContextLine::from(matched.record),
            history: context_window(snapshot, matched.index, cfg.context_before, cfg.context_after),
            recent: recent_window(before_current, cfg.recent_context),
            unique_senders,
            min_senders: cfg.min_unique_senders,
            now,
        };

        match judge.judge(&request).await {
            Ok(j) if j.should_remind => Decision::Remind(reminder(Some(j.reason))),
            Ok(j) => Decision::Silent(SilentReason::JudgeDeclined { reason: j.reason }),
            Err(e) => {
                warn!(error = %e, "Judgment failed, staying silent");
                Decision::Silent(SilentReason::JudgeFailed)
            }
        }
    }
}
