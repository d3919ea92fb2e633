//! The stored unit: one processed message with its fingerprints.

use serde::{Deserialize, Serialize};

use crate::fingerprint::{ImageFingerprint, TextFingerprint};

/// One processed message. Immutable once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default, alias = "embedding", skip_serializing_if = "Option::is_none")]
    pub text_fingerprint: Option<TextFingerprint>,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default, alias = "cached_image", skip_serializing_if = "Option::is_none")]
    pub cached_image_path: Option<String>,
    #[serde(default, alias = "image_hash", skip_serializing_if = "Option::is_none")]
    pub image_fingerprint: Option<ImageFingerprint>,
}

impl Record {
    /// New record with a fresh id and no fingerprints.
    pub fn new(
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        content: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            content: content.into(),
            timestamp,
            text_fingerprint: None,
            has_image: false,
            cached_image_path: None,
            image_fingerprint: None,
        }
    }

    pub fn with_text_fingerprint(mut self, fp: Option<TextFingerprint>) -> Self {
        self.text_fingerprint = fp;
        self
    }

    /// Marks the record as carrying an image, with its fingerprint if one was computed.
    pub fn with_image(mut self, fp: Option<ImageFingerprint>, cached_path: Option<String>) -> Self {
        self.has_image = true;
        self.image_fingerprint = fp;
        self.cached_image_path = cached_path;
        self
    }

    /// Enforces the record invariants: no image fingerprint without an image, no empty vectors.
    pub fn normalized(mut self) -> Self {
        if !self.has_image {
            self.image_fingerprint = None;
        }
        if self
            .text_fingerprint
            .as_ref()
            .is_some_and(|fp| fp.dimension() == 0)
        {
            self.text_fingerprint = None;
        }
        self
    }

    pub fn has_any_fingerprint(&self) -> bool {
        self.text_fingerprint.is_some() || self.image_fingerprint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fingerprints_are_omitted() {
        let r = Record::new("1", "ada", "hello", 10.0);
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("text_fingerprint"));
        assert!(!json.contains("image_fingerprint"));
        assert!(!json.contains("cached_image_path"));
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let json = r#"{
            "id": "x", "sender_id": "1", "sender_name": "ada", "content": "hi",
            "timestamp": 1.5, "embedding": [0.5, 0.5], "has_image": true,
            "cached_image": "/tmp/a.jpg", "image_hash": "d41d8cd98f00b204e9800998ecf8427e"
        }"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert_eq!(r.text_fingerprint, Some(TextFingerprint(vec![0.5, 0.5])));
        assert_eq!(r.cached_image_path.as_deref(), Some("/tmp/a.jpg"));
        assert_eq!(
            r.image_fingerprint,
            Some(ImageFingerprint::checksum("d41d8cd98f00b204e9800998ecf8427e"))
        );
    }

    #[test]
    fn test_normalized_drops_image_fingerprint_without_image() {
        let mut r = Record::new("1", "ada", "hi", 1.0);
        r.image_fingerprint = Some(ImageFingerprint::perceptual("0".repeat(64)));
        r.text_fingerprint = Some(TextFingerprint(vec![]));
        let r = r.normalized();
        assert!(r.image_fingerprint.is_none());
        assert!(r.text_fingerprint.is_none());
    }
}
