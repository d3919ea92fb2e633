//! # Match engine
//!
//! Scans a conversation's records for the best fingerprint match and counts how many distinct
//! senders posted matching content. Functions take any slice of `Borrow<Record>` so they work on
//! the store's `Arc<Record>` snapshots and on plain records in tests.

use std::borrow::Borrow;
use std::collections::HashSet;

use crate::fingerprint::{ImageFingerprint, TextFingerprint};
use crate::record::Record;

/// Which fingerprint produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Text,
    Image,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Text => "text",
            MatchKind::Image => "image",
        }
    }
}

/// A record at or above the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub index: usize,
    pub record: &'a Record,
    pub score: f32,
    pub kind: MatchKind,
}

/// Result of one scan.
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    /// Highest-scoring record reaching the threshold; the earliest one on ties.
    pub best: Option<Match<'a>>,
    /// Highest score seen at all, whether or not it reached the threshold.
    pub best_score_seen: Option<f32>,
}

/// One line of judgment context. Never carries fingerprints.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextLine {
    pub sender_name: String,
    pub content: String,
    pub timestamp: f64,
}

impl From<&Record> for ContextLine {
    fn from(r: &Record) -> Self {
        Self {
            sender_name: r.sender_name.clone(),
            content: r.content.clone(),
            timestamp: r.timestamp,
        }
    }
}

fn scan<'a, R, F>(
    records: &'a [R],
    threshold: f32,
    exclude_recent: usize,
    kind: MatchKind,
    score: F,
) -> MatchOutcome<'a>
where
    R: Borrow<Record>,
    F: Fn(&Record) -> Option<f32>,
{
    let end = records.len().saturating_sub(exclude_recent);
    let mut best_score: Option<f32> = None;
    let mut best_index = 0;

    for (i, r) in records[..end].iter().enumerate() {
        let Some(s) = score(r.borrow()) else {
            continue;
        };
        if best_score.map_or(true, |b| s > b) {
            best_score = Some(s);
            best_index = i;
        }
    }

    let best = best_score.filter(|s| *s >= threshold).map(|s| Match {
        index: best_index,
        record: records[best_index].borrow(),
        score: s,
        kind,
    });
    MatchOutcome {
        best,
        best_score_seen: best_score,
    }
}

/// Best text match among `records[..len - exclude_recent]`. Records without a text
/// fingerprint of the query's dimension are skipped.
pub fn best_text_match<'a, R: Borrow<Record>>(
    records: &'a [R],
    query: &TextFingerprint,
    threshold: f32,
    exclude_recent: usize,
) -> MatchOutcome<'a> {
    scan(records, threshold, exclude_recent, MatchKind::Text, |r| {
        r.text_fingerprint.as_ref()?.similarity(query)
    })
}

/// Best image match among `records[..len - exclude_recent]`. Records without an image
/// fingerprint of the query's kind are skipped.
pub fn best_image_match<'a, R: Borrow<Record>>(
    records: &'a [R],
    query: &ImageFingerprint,
    threshold: f32,
    exclude_recent: usize,
) -> MatchOutcome<'a> {
    scan(records, threshold, exclude_recent, MatchKind::Image, |r| {
        r.image_fingerprint.as_ref()?.similarity(query)
    })
}

fn distinct_senders<R, F>(records: &[R], matches: F) -> (usize, HashSet<String>)
where
    R: Borrow<Record>,
    F: Fn(&Record) -> bool,
{
    let senders: HashSet<String> = records
        .iter()
        .map(|r| r.borrow())
        .filter(|r| !r.sender_id.is_empty() && matches(r))
        .map(|r| r.sender_id.clone())
        .collect();
    (senders.len(), senders)
}

/// Distinct `sender_id`s among records whose text fingerprint meets `threshold`.
pub fn count_distinct_senders_text<R: Borrow<Record>>(
    records: &[R],
    query: &TextFingerprint,
    threshold: f32,
) -> (usize, HashSet<String>) {
    distinct_senders(records, |r| {
        r.text_fingerprint
            .as_ref()
            .and_then(|fp| fp.similarity(query))
            .is_some_and(|s| s >= threshold)
    })
}

/// Distinct `sender_id`s among records whose image fingerprint meets `threshold`.
pub fn count_distinct_senders_image<R: Borrow<Record>>(
    records: &[R],
    query: &ImageFingerprint,
    threshold: f32,
) -> (usize, HashSet<String>) {
    distinct_senders(records, |r| {
        r.image_fingerprint
            .as_ref()
            .and_then(|fp| fp.similarity(query))
            .is_some_and(|s| s >= threshold)
    })
}

/// `records[index - before ..= index + after]`, clipped to bounds.
pub fn context_window<R: Borrow<Record>>(
    records: &[R],
    index: usize,
    before: usize,
    after: usize,
) -> Vec<ContextLine> {
    if records.is_empty() {
        return Vec::new();
    }
    let index = index.min(records.len() - 1);
    let start = index.saturating_sub(before);
    let end = index.saturating_add(after).saturating_add(1).min(records.len());
    records[start..end]
        .iter()
        .map(|r| ContextLine::from(r.borrow()))
        .collect()
}

/// The last `count` records of `records`.
pub fn recent_window<R: Borrow<Record>>(records: &[R], count: usize) -> Vec<ContextLine> {
    let start = records.len().saturating_sub(count);
    records[start..]
        .iter()
        .map(|r| ContextLine::from(r.borrow()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn text(sender: &str, ts: f64, v: Vec<f32>) -> Record {
        Record::new(sender, sender, format!("msg@{}", ts), ts)
            .with_text_fingerprint(Some(TextFingerprint(v)))
    }

    fn image(sender: &str, ts: f64, hex: String) -> Record {
        Record::new(sender, sender, "[image]", ts)
            .with_image(Some(ImageFingerprint::perceptual(hex)), None)
    }

    #[test]
    fn test_best_text_match_prefers_highest_then_earliest() {
        let records = vec![
            text("a", 1.0, vec![1.0, 0.0]),
            text("b", 2.0, vec![0.9, 0.1]),
            text("c", 3.0, vec![1.0, 0.0]),
        ];
        let out = best_text_match(&records, &TextFingerprint(vec![1.0, 0.0]), 0.5, 0);
        let m = out.best.unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.record.sender_id, "a");
        assert_eq!(m.kind, MatchKind::Text);
        assert!((out.best_score_seen.unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_best_score_is_reported_without_a_match() {
        let records = vec![text("a", 1.0, vec![1.0, 0.0])];
        let out = best_text_match(&records, &TextFingerprint(vec![0.6, 0.8]), 0.95, 0);
        assert!(out.best.is_none());
        assert!((out.best_score_seen.unwrap() - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_exclude_recent_and_dimension_mismatch() {
        let records = vec![
            text("a", 1.0, vec![1.0, 0.0, 0.0, 0.0]),
            text("b", 2.0, vec![1.0, 0.0]),
        ];
        let q = TextFingerprint(vec![1.0, 0.0]);
        assert!(best_text_match(&records, &q, 0.9, 1).best.is_none());
        assert!(best_text_match(&records, &q, 0.9, 1).best_score_seen.is_none());
        assert_eq!(best_text_match(&records, &q, 0.9, 0).best.unwrap().index, 1);
        assert!(best_text_match(&records, &q, 0.9, 5).best.is_none());
    }

    #[test]
    fn test_best_image_match_over_arc_snapshot() {
        let zero = "0".repeat(64);
        let mut near = "0".repeat(62);
        near.push_str("ff");
        let records: Vec<Arc<Record>> = vec![
            Arc::new(image("a", 1.0, "f".repeat(64))),
            Arc::new(image("b", 2.0, near)),
            Arc::new(Record::new("c", "c", "plain text", 3.0)),
        ];
        let out = best_image_match(&records, &ImageFingerprint::perceptual(zero), 0.9, 0);
        let m = out.best.unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.kind, MatchKind::Image);
        assert!((m.score - (1.0 - 8.0 / 256.0)).abs() < 1e-6);
    }

    #[test]
    fn test_image_match_ignores_other_fingerprint_kind() {
        let hex = "ab".repeat(32);
        let records = vec![Record::new("a", "a", "x", 1.0)
            .with_image(Some(ImageFingerprint::checksum(hex.clone())), None)];
        let out = best_image_match(&records, &ImageFingerprint::perceptual(hex), 0.5, 0);
        assert!(out.best.is_none());
        assert!(out.best_score_seen.is_none());
    }

    #[test]
    fn test_count_distinct_senders() {
        let records = vec![
            text("a", 1.0, vec![1.0, 0.0]),
            text("a", 2.0, vec![1.0, 0.0]),
            text("b", 3.0, vec![1.0, 0.01]),
            text("c", 4.0, vec![0.0, 1.0]),
            text("", 5.0, vec![1.0, 0.0]),
        ];
        let (count, senders) =
            count_distinct_senders_text(&records, &TextFingerprint(vec![1.0, 0.0]), 0.95);
        assert_eq!(count, 2);
        assert!(senders.contains("a") && senders.contains("b"));
    }

    #[test]
    fn test_context_window_clips_to_bounds() {
        let records: Vec<Record> = (0..10)
            .map(|i| Record::new("s", "s", format!("m{}", i), i as f64))
            .collect();
        let ctx = context_window(&records, 1, 3, 2);
        let contents: Vec<&str> = ctx.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3"]);
        assert_eq!(context_window(&records, 9, 1, 40).len(), 2);
        assert!(context_window::<Record>(&[], 0, 1, 1).is_empty());

        let recent = recent_window(&records[..9], 3);
        assert_eq!(recent.first().unwrap().content, "m6");
        assert_eq!(recent.last().unwrap().content, "m8");
    }
}
