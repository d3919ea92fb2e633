//! Rules applied to extracted content: minimum text length and ignore patterns.
//!
//! They run after extraction because a dropped sticker can turn an image message into a
//! text-only one.

use std::fmt;

use regex::Regex;
use tracing::warn;

use crate::config::DetectorConfig;

use super::extract::Extracted;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRejection {
    /// Text-only content shorter than the minimum (in characters).
    TooShort { chars: usize, min: usize },
    /// Content fully matched an ignore pattern.
    IgnorePattern { pattern: String },
}

impl fmt::Display for ContentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRejection::TooShort { chars, min } => {
                write!(f, "too short ({} < {} chars)", chars, min)
            }
            ContentRejection::IgnorePattern { pattern } => {
                write!(f, "matches ignore pattern {:?}", pattern)
            }
        }
    }
}

pub struct ContentFilter {
    min_text_length: usize,
    ignore: Vec<(String, Regex)>,
}

fn full_match(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid ignore pattern skipped");
            None
        }
    }
}

impl ContentFilter {
    pub fn new(config: &DetectorConfig) -> Self {
        let ignore = config
            .ignore_patterns
            .iter()
            .filter_map(|p| full_match(p).map(|re| (p.clone(), re)))
            .collect();
        Self {
            min_text_length: config.min_text_length,
            ignore,
        }
    }

    pub fn check(&self, extracted: &Extracted) -> Option<ContentRejection> {
        let content = extracted.content.as_str();
        if extracted.image_url.is_none() {
            let chars = content.chars().count();
            if chars < self.min_text_length {
                return Some(ContentRejection::TooShort {
                    chars,
                    min: self.min_text_length,
                });
            }
        }
        self.ignore
            .iter()
            .find(|(_, re)| re.is_match(content))
            .map(|(pattern, _)| ContentRejection::IgnorePattern {
                pattern: pattern.clone(),
            })
    }
}
