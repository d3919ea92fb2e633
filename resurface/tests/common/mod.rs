//! Shared test doubles: keyed embedder, scripted judge and vision, recording reminder sink,
//! in-memory image fetcher, and message builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use embedding::EmbeddingService;
use resurface::capabilities::{
    ImageFetcher, JudgeCapability, JudgeRequest, Judgment, ReminderSink, VisionCapability,
    VisionVerdict,
};
use resurface::clock::ManualClock;
use resurface::{Chat, ConversationStore, Message, User};

/// Noon UTC, 2023-11-14.
pub const T0: f64 = 1_699_963_200.0;
pub const GROUP: i64 = -1001;

/// Embeds known strings to fixed vectors; unknown content fails like a provider error.
#[derive(Default, Clone)]
pub struct KeyedEmbedder {
    vectors: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    calls: Arc<AtomicUsize>,
}

impl KeyedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, content: &str, vector: Vec<f32>) -> Self {
        self.vectors
            .lock()
            .unwrap()
            .insert(content.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for KeyedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow!("no vector for {:?}", text))
    }

    fn model(&self) -> &str {
        "keyed-test"
    }
}

/// Judge returning a fixed verdict (or failing) and keeping every request.
#[derive(Clone)]
pub struct ScriptedJudge {
    verdict: Option<Judgment>,
    requests: Arc<Mutex<Vec<JudgeRequest>>>,
}

impl ScriptedJudge {
    pub fn remind(reason: &str) -> Self {
        Self::with(Some(Judgment {
            should_remind: true,
            reason: reason.to_string(),
        }))
    }

    pub fn decline(reason: &str) -> Self {
        Self::with(Some(Judgment {
            should_remind: false,
            reason: reason.to_string(),
        }))
    }

    pub fn failing() -> Self {
        Self::with(None)
    }

    fn with(verdict: Option<Judgment>) -> Self {
        Self {
            verdict,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<JudgeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JudgeCapability for ScriptedJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment> {
        self.requests.lock().unwrap().push(request.clone());
        self.verdict
            .clone()
            .ok_or_else(|| anyhow!("judge provider unreachable"))
    }
}

/// Vision answering per URL; unknown URLs fail.
#[derive(Default, Clone)]
pub struct MapVision {
    verdicts: Arc<Mutex<HashMap<String, VisionVerdict>>>,
}

impl MapVision {
    pub fn with(self, url: &str, is_sticker: bool, content: &str) -> Self {
        self.verdicts.lock().unwrap().insert(
            url.to_string(),
            VisionVerdict {
                is_sticker,
                content: content.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl VisionCapability for MapVision {
    async fn describe(&self, image_url: &str) -> Result<VisionVerdict> {
        self.verdicts
            .lock()
            .unwrap()
            .get(image_url)
            .cloned()
            .ok_or_else(|| anyhow!("vision failed for {}", image_url))
    }
}

/// Serves image bytes from memory.
#[derive(Default, Clone)]
pub struct MemoryFetcher {
    images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryFetcher {
    pub fn with(self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.lock().unwrap().insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 {}", url))
    }
}

/// Parks every download until [`GatedFetcher::release`] is called, then serves fixed bytes.
#[derive(Clone)]
pub struct GatedFetcher {
    bytes: Vec<u8>,
    entered: Arc<Notify>,
    released: Arc<Notify>,
}

impl GatedFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            entered: Arc::new(Notify::new()),
            released: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a download has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl ImageFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        self.entered.notify_one();
        self.released.notified().await;
        Ok(self.bytes.clone())
    }
}

/// Records the ids of messages it was asked to remind.
#[derive(Default, Clone)]
pub struct RecordingReminder {
    reminded: Arc<Mutex<Vec<String>>>,
}

impl RecordingReminder {
    pub fn reminded(&self) -> Vec<String> {
        self.reminded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderSink for RecordingReminder {
    async fn remind(&self, message: &Message) -> Result<()> {
        self.reminded.lock().unwrap().push(message.id.clone());
        Ok(())
    }
}

pub fn user(id: i64, name: &str) -> User {
    User {
        id,
        username: Some(name.to_lowercase()),
        first_name: Some(name.to_string()),
        last_name: None,
    }
}

/// Group message from user `sender` (display name `Uid`).
pub fn group_message(id: &str, sender: i64, content: &str) -> Message {
    Message {
        id: id.to_string(),
        user: user(sender, &format!("U{}", sender)),
        chat: Chat::group(GROUP),
        content: content.to_string(),
        image_urls: Vec::new(),
        created_at: chrono::Utc::now(),
    }
}

pub fn image_message(id: &str, sender: i64, content: &str, url: &str) -> Message {
    let mut msg = group_message(id, sender, content);
    msg.image_urls.push(url.to_string());
    msg
}

pub fn manual_store(root: &std::path::Path, retention_days: u32, start: f64) -> (Arc<ConversationStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let store = Arc::new(ConversationStore::new(root, retention_days, clock.clone()));
    (store, clock)
}

/// Deterministic test image: smooth diagonal bands, so neighbouring pixels differ.
pub fn pattern_png(width: u32, height: u32, phase: f32) -> Vec<u8> {
    let img = image::GrayImage::from_fn(width, height, |x, y| {
        let v = ((x as f32 * 0.31 + phase).sin() * (y as f32 * 0.17).cos() * 110.0 + 128.0) as u8;
        image::Luma([v])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
