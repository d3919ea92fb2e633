//! Decision pipeline scenarios with mock capabilities and a manual clock.

mod common;

use std::sync::Arc;

use common::*;
use resurface::config::DetectorConfig;
use resurface::matching::MatchKind;
use resurface::pipeline::{Decision, Pipeline, SilentReason, IMAGE_PLACEHOLDER};
use resurface::store::ImageCache;

const NEWS: &str = "the cafeteria is closing next week";

fn config(enable_judge: bool) -> DetectorConfig {
    DetectorConfig {
        enable_judge,
        ..DetectorConfig::default()
    }
}

fn embedder() -> KeyedEmbedder {
    KeyedEmbedder::new()
        .with(NEWS, vec![1.0, 0.0, 0.0])
        .with("lunch anyone?", vec![0.0, 1.0, 0.0])
}

struct Harness {
    _dir: tempfile::TempDir,
    clock: Arc<resurface::clock::ManualClock>,
    pipeline: Pipeline,
    reminder: RecordingReminder,
}

fn harness(config: DetectorConfig, judge: Option<ScriptedJudge>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let (store, clock) = manual_store(dir.path(), config.retention_days, T0);
    let reminder = RecordingReminder::default();
    let mut pipeline = Pipeline::new(config, store)
        .with_embedder(Arc::new(embedder()))
        .with_reminder(Arc::new(reminder.clone()));
    if let Some(judge) = judge {
        pipeline = pipeline.with_judge(Arc::new(judge));
    }
    Harness {
        _dir: dir,
        clock,
        pipeline,
        reminder,
    }
}

impl Harness {
    async fn post_at(&self, ts: f64, id: &str, sender: i64, content: &str) -> Decision {
        self.clock.set(ts);
        self.pipeline
            .process(&group_message(id, sender, content))
            .await
    }

    async fn records(&self) -> usize {
        self.pipeline
            .store()
            .load(&GROUP.to_string())
            .await
            .len()
    }
}

/// **Test: cooldown keeps a repost silent until the window has passed.**
///
/// Setup: A posts at t0, C reposts at t0+10 (two senders, below the minimum of 3).
/// Action: B reposts at t0+cooldown-1, then D at t0+cooldown+1, judgment disabled.
/// Expected: B is silent by cooldown; D triggers a reminder crediting A's record.
#[tokio::test]
async fn test_cooldown_then_remind() {
    let h = harness(config(false), None);
    let cooldown = h.pipeline.config().cooldown_seconds;

    assert!(matches!(
        h.post_at(T0, "1", 1, NEWS).await,
        Decision::Silent(SilentReason::NoMatch { best_score: None })
    ));
    assert_eq!(
        h.post_at(T0 + 10.0, "2", 3, NEWS).await.silent_reason(),
        Some(&SilentReason::TooFewSenders { count: 2, required: 3 })
    );

    let decision = h.post_at(T0 + cooldown - 1.0, "3", 2, NEWS).await;
    assert!(matches!(
        decision.silent_reason(),
        Some(SilentReason::Cooldown { .. })
    ));
    assert!(h.reminder.reminded().is_empty());

    let decision = h.post_at(T0 + cooldown + 1.0, "4", 4, NEWS).await;
    let Decision::Remind(reminder) = decision else {
        panic!("expected a reminder, got {:?}", decision);
    };
    assert_eq!(reminder.matched_sender_id, "1");
    assert_eq!(reminder.kind, MatchKind::Text);
    assert_eq!(reminder.unique_senders, 4);
    assert!(reminder.reason.is_none());
    assert_eq!(h.reminder.reminded(), vec!["4".to_string()]);
    assert_eq!(h.records().await, 4);
}

/// **Test: a sender matching their own earlier post is never reminded.**
#[tokio::test]
async fn test_self_repost_is_silent() {
    let h = harness(config(false), None);
    h.post_at(T0, "1", 1, NEWS).await;
    h.post_at(T0 + 1.0, "2", 2, NEWS).await;
    h.post_at(T0 + 2.0, "3", 3, NEWS).await;

    let decision = h.post_at(T0 + 10_000.0, "4", 1, NEWS).await;
    assert_eq!(decision.silent_reason(), Some(&SilentReason::SelfRepost));
    assert!(h.reminder.reminded().is_empty());
}

/// **Test: two distinct matching senders stay below a minimum of three.**
#[tokio::test]
async fn test_too_few_senders_is_silent() {
    let h = harness(config(false), None);
    h.post_at(T0, "1", 1, NEWS).await;
    h.post_at(T0 + 1.0, "2", 2, NEWS).await;

    let decision = h.post_at(T0 + 10_000.0, "3", 1, NEWS).await;
    assert_eq!(
        decision.silent_reason(),
        Some(&SilentReason::TooFewSenders { count: 2, required: 3 })
    );
    assert_eq!(h.records().await, 3);
}

/// **Test: unrelated content does not match and is still recorded.**
#[tokio::test]
async fn test_unrelated_content_records_without_match() {
    let h = harness(config(false), None);
    h.post_at(T0, "1", 1, NEWS).await;
    let decision = h.post_at(T0 + 5.0, "2", 2, "lunch anyone?").await;
    let Some(SilentReason::NoMatch { best_score: Some(score) }) = decision.silent_reason() else {
        panic!("expected NoMatch, got {:?}", decision);
    };
    assert!(score.abs() < 1e-3);
    assert_eq!(h.records().await, 2);
}

/// **Test: judge verdicts decide; failures and a missing judge stay silent.**
#[tokio::test]
async fn test_judgment_gate_outcomes() {
    async fn run(judge: Option<ScriptedJudge>) -> (Decision, Option<ScriptedJudge>) {
        let h = harness(config(true), judge.clone());
        h.post_at(T0, "1", 1, NEWS).await;
        h.post_at(T0 + 1.0, "2", 2, "lunch anyone?").await;
        h.post_at(T0 + 2.0, "3", 2, NEWS).await;
        (h.post_at(T0 + 7200.0, "4", 3, NEWS).await, judge)
    }

    let (decision, judge) = run(Some(ScriptedJudge::remind("seen this morning"))).await;
    let Decision::Remind(reminder) = decision else {
        panic!("expected a reminder");
    };
    assert_eq!(reminder.reason.as_deref(), Some("seen this morning"));

    let requests = judge.unwrap().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.content, NEWS);
    assert_eq!(request.sender_name, "U3");
    assert_eq!(request.matched.sender_name, "U1");
    assert_eq!(request.unique_senders, 3);
    assert_eq!(request.min_senders, 3);
    assert_eq!(request.history.len(), 4);
    assert_eq!(request.recent.len(), 3);
    assert_eq!(request.recent.last().unwrap().timestamp, T0 + 2.0);

    let (decision, _) = run(Some(ScriptedJudge::decline("different topic"))).await;
    assert_eq!(
        decision.silent_reason(),
        Some(&SilentReason::JudgeDeclined {
            reason: "different topic".to_string()
        })
    );

    let (decision, _) = run(Some(ScriptedJudge::failing())).await;
    assert_eq!(decision.silent_reason(), Some(&SilentReason::JudgeFailed));

    let (decision, _) = run(None).await;
    assert_eq!(decision.silent_reason(), Some(&SilentReason::JudgeUnavailable));
}

/// **Test: without any fingerprint the message is recorded but never matched.**
#[tokio::test]
async fn test_no_fingerprint_is_recorded() {
    let h = harness(config(false), None);
    let decision = h.post_at(T0, "1", 1, "unknown to the embedder").await;
    assert_eq!(decision.silent_reason(), Some(&SilentReason::NoFingerprint));
    assert_eq!(h.records().await, 1);
}

/// **Test: image reposts match on the perceptual hash and sticker-only posts are ignored.**
///
/// Setup: fetcher serves one PNG under two URLs; vision marks a third URL as a sticker.
/// Action: three senders post the image (no text); then a sticker-only post.
/// Expected: the third post reminds with an image match; the sticker is not recorded.
#[tokio::test]
async fn test_image_repost_and_sticker() {
    let dir = tempfile::tempdir().unwrap();
    let (store, clock) = manual_store(&dir.path().join("conversations"), 7, T0);
    let png = pattern_png(64, 64, 0.0);
    let fetcher = MemoryFetcher::default()
        .with("https://img/a.png", png.clone())
        .with("https://img/b.png", png);
    let vision = MapVision::default()
        .with("https://img/sticker.webp", true, "")
        .with("https://img/a.png", false, "")
        .with("https://img/b.png", false, "");
    let reminder = RecordingReminder::default();
    let pipeline = Pipeline::new(config(false), store)
        .with_image_cache(ImageCache::new(dir.path().join("image_cache")))
        .with_fetcher(Arc::new(fetcher.clone()))
        .with_vision(Arc::new(vision))
        .with_reminder(Arc::new(reminder.clone()));

    for (i, url) in ["https://img/a.png", "https://img/b.png"].iter().enumerate() {
        clock.set(T0 + i as f64);
        let d = pipeline
            .process(&image_message(&i.to_string(), i as i64 + 1, "", url))
            .await;
        assert!(!d.is_remind());
    }

    clock.set(T0 + 7200.0);
    let decision = pipeline
        .process(&image_message("9", 3, "", "https://img/a.png"))
        .await;
    let Decision::Remind(r) = decision else {
        panic!("expected a reminder, got {:?}", decision);
    };
    assert_eq!(r.kind, MatchKind::Image);
    assert!((r.score - 1.0).abs() < 1e-6);
    assert_eq!(r.matched_sender_id, "1");

    let records = pipeline.store().load(&GROUP.to_string()).await;
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.content == IMAGE_PLACEHOLDER && r.has_image));
    assert!(records
        .iter()
        .all(|r| r.cached_image_path.as_ref().is_some_and(|p| std::path::Path::new(p).exists())));

    let sticker = pipeline
        .process(&image_message("10", 4, "", "https://img/sticker.webp"))
        .await;
    assert_eq!(sticker, Decision::Ignored);
    assert_eq!(pipeline.store().load(&GROUP.to_string()).await.len(), 3);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(reminder.reminded(), vec!["9".to_string()]);
}

/// **Test: a message whose image download finishes late is stamped after the one that overtook it.**
///
/// Setup: an image message parks in the fetcher at t0.
/// Action: a text message is processed at t0+10, then the download is released at t0+20.
/// Expected: the working set is ascending, the image record carries t0+20 (and so does its
/// cache file), and a cold load returns the same order.
#[tokio::test]
async fn test_slow_image_download_keeps_records_ascending() {
    let dir = tempfile::tempdir().unwrap();
    let conversations = dir.path().join("conversations");
    let (store, clock) = manual_store(&conversations, 7, T0);
    let fetcher = GatedFetcher::new(pattern_png(32, 32, 0.0));
    let pipeline = Arc::new(
        Pipeline::new(config(false), store)
            .with_embedder(Arc::new(embedder()))
            .with_image_cache(ImageCache::new(dir.path().join("image_cache")))
            .with_fetcher(Arc::new(fetcher.clone())),
    );

    let slow = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .process(&image_message("1", 1, "", "https://img/slow.png"))
                .await
        })
    };
    fetcher.wait_entered().await;

    clock.set(T0 + 10.0);
    pipeline.process(&group_message("2", 2, NEWS)).await;

    clock.set(T0 + 20.0);
    fetcher.release();
    slow.await.unwrap();

    let conv = GROUP.to_string();
    let records = pipeline.store().load(&conv).await;
    let stamps: Vec<f64> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![T0 + 10.0, T0 + 20.0]);
    assert_eq!(records[1].sender_id, "1");
    let cached = records[1].cached_image_path.as_deref().unwrap();
    assert!(cached.ends_with(&ImageCache::file_name(T0 + 20.0)));

    pipeline.store().flush(&conv).await;
    let (cold, _) = manual_store(&conversations, 7, T0 + 20.0);
    let cold_ids: Vec<String> = cold.load(&conv).await.iter().map(|r| r.id.clone()).collect();
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(cold_ids, ids);
}

/// **Test: length and ignore rules apply to the extracted content.**
///
/// Setup: minimum length 2, ignore pattern `\d+`, vision marks one URL as a sticker.
/// Action: "k" with that sticker, then "12345", then ordinary text.
/// Expected: the first two are ignored (the sticker is dropped, leaving short text); only the
/// ordinary text is recorded.
#[tokio::test]
async fn test_content_rules_apply_after_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _clock) = manual_store(dir.path(), 7, T0);
    let vision = MapVision::default().with("https://img/sticker.webp", true, "");
    let pipeline = Pipeline::new(
        DetectorConfig {
            ignore_patterns: vec!["\\d+".to_string()],
            ..config(false)
        },
        store,
    )
    .with_embedder(Arc::new(embedder()))
    .with_vision(Arc::new(vision));

    let sticker_with_text = image_message("1", 1, "k", "https://img/sticker.webp");
    assert_eq!(pipeline.process(&sticker_with_text).await, Decision::Ignored);
    assert_eq!(
        pipeline.process(&group_message("2", 1, "12345")).await,
        Decision::Ignored
    );
    assert!(!pipeline
        .process(&group_message("3", 1, "lunch anyone?"))
        .await
        .is_remind());

    let records = pipeline.store().load(&GROUP.to_string()).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "lunch anyone?");
}
