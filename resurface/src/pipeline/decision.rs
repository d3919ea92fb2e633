//! Pipeline outcomes.

use std::fmt;

use crate::matching::MatchKind;

/// What the pipeline did with one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing to record (no text and no kept image).
    Ignored,
    /// Recorded; no reminder.
    Silent(SilentReason),
    /// Recorded; a reminder was sent (or attempted).
    Remind(Reminder),
}

impl Decision {
    pub fn is_remind(&self) -> bool {
        matches!(self, Decision::Remind(_))
    }

    pub fn silent_reason(&self) -> Option<&SilentReason> {
        match self {
            Decision::Silent(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Why a recorded message did not trigger a reminder.
#[derive(Debug, Clone, PartialEq)]
pub enum SilentReason {
    /// Neither a text nor an image fingerprint could be computed.
    NoFingerprint,
    /// No record reached the threshold.
    NoMatch { best_score: Option<f32> },
    TooFewSenders { count: usize, required: usize },
    /// The sender posted the matched record themselves.
    SelfRepost,
    Cooldown { elapsed: f64, cooldown: f64 },
    JudgeDeclined { reason: String },
    /// Judge call failed or its reply could not be parsed.
    JudgeFailed,
    /// Judgment is enabled but no judge is configured.
    JudgeUnavailable,
}

impl fmt::Display for SilentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SilentReason::NoFingerprint => write!(f, "no fingerprint"),
            SilentReason::NoMatch { best_score: Some(s) } => {
                write!(f, "no match (best score {:.4})", s)
            }
            SilentReason::NoMatch { best_score: None } => write!(f, "no match"),
            SilentReason::TooFewSenders { count, required } => {
                write!(f, "too few senders ({}/{})", count, required)
            }
            SilentReason::SelfRepost => write!(f, "self repost"),
            SilentReason::Cooldown { elapsed, cooldown } => {
                write!(f, "cooldown ({:.0}s of {:.0}s)", elapsed, cooldown)
            }
            SilentReason::JudgeDeclined { reason } => write!(f, "judge declined: {}", reason),
            SilentReason::JudgeFailed => write!(f, "judge failed"),
            SilentReason::JudgeUnavailable => write!(f, "judge unavailable"),
        }
    }
}

/// The match that triggered a reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub matched_id: String,
    pub matched_sender_id: String,
    pub matched_sender_name: String,
    pub kind: MatchKind,
    pub score: f32,
    pub unique_senders: usize,
    /// Judge's reason; `None` when judgment is disabled.
    pub reason: Option<String>,
}
