//! External capabilities the detector calls: vision, judgment, image fetching, reminders.
//!
//! Each is one small trait; the pipeline depends only on these, and provider adapters
//! (`llm-client`, `reqwest`, teloxide) implement them once.

mod fetch;
mod json_reply;
mod judge;
mod reminder;
mod vision;

pub use fetch::{HttpImageFetcher, ImageFetcher, MAX_IMAGE_BYTES};
pub use judge::{parse_judgment, JudgeCapability, JudgeRequest, Judgment, LlmJudge};
pub use reminder::{ReminderSink, DEFAULT_REMINDER_TEXT};
pub use vision::{parse_vision_reply, LlmVision, VisionCapability, VisionVerdict};
