//! Content extraction: message text plus at most one kept image, described when vision is available.

use tracing::{debug, info, warn};

use crate::capabilities::VisionCapability;
use crate::core::Message;

/// Placeholder content for an undescribed image without text.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// What the pipeline fingerprints and records for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Text and image description, as recorded.
    pub content: String,
    /// Whether `content` carries real text worth embedding (not just the placeholder).
    pub embeddable: bool,
    /// URL of the kept image, if any.
    pub image_url: Option<String>,
}

fn describe_line(text: &str, description: &str) -> String {
    if text.is_empty() {
        format!("[image: {}]", description)
    } else {
        format!("{} [image: {}]", text, description)
    }
}

/// Extracts content from `message`.
///
/// Images are tried in order; the first one that is not a sticker is kept. Without a vision
/// capability, or when the call fails, that image is kept undescribed. Returns `None` when there
/// is neither text nor a kept image.
pub async fn extract_content(
    message: &Message,
    vision: Option<&dyn VisionCapability>,
) -> Option<Extracted> {
    let text = message.content.trim().to_string();

    for url in &message.image_urls {
        let Some(vision) = vision else {
            return Some(undescribed(text, url));
        };
        match vision.describe(url).await {
            Ok(verdict) if verdict.is_sticker => {
                info!(message_id = %message.id, "step: sticker image skipped");
                continue;
            }
            Ok(verdict) if verdict.content.trim().is_empty() => {
                return Some(undescribed(text, url));
            }
            Ok(verdict) => {
                debug!(message_id = %message.id, "step: image described");
                return Some(Extracted {
                    content: describe_line(&text, verdict.content.trim()),
                    embeddable: true,
                    image_url: Some(url.clone()),
                });
            }
            Err(e) => {
                warn!(error = %e, message_id = %message.id, "Vision call failed, keeping image undescribed");
                return Some(undescribed(text, url));
            }
        }
    }

    if text.is_empty() {
        return None;
    }
    Some(Extracted {
        content: text,
        embeddable: true,
        image_url: None,
    })
}

fn undescribed(text: String, url: &str) -> Extracted {
    let embeddable = !text.is_empty();
    Extracted {
        content: if embeddable {
            text
        } else {
            IMAGE_PLACEHOLDER.to_string()
        },
        embeddable,
        image_url: Some(url.to_string()),
    }
}
