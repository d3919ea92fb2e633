//! Judgment prompt: default template, variables and line formats.

use chrono::DateTime;

use crate::template::{render_template, TemplateError};

/// Characters of the matched record's content quoted in the prompt.
pub const MATCHED_CONTENT_PREVIEW_CHARS: usize = 300;

/// Default judgment prompt. Placeholders are filled from [`JudgePromptVars`].
pub const DEFAULT_JUDGE_PROMPT: &str = r#"You analyse messages in a group chat. Decide whether the current message is "old news" being posted again, and whether the poster should get a reminder.

## Established facts
1. Similar content to the current message was found in the history.
2. {unique_count} people have already posted similar content (threshold: {min_senders}).
3. The current sender is not the original poster.

## Data

Earlier post ({matched_time}, {matched_time_ago}):
Sender: {matched_sender}
Content: {matched_content}

Context around the earlier post:
{history_str}

Current context (most recent messages):
{current_str}

Message to judge:
Sender: {sender_name}
Content: {content}

## Remind (should_remind: true) when
- the sender clearly does not know the group already discussed this
- the content is forwarded or shared without any comment
- it is a bare image with no reference to the conversation
- it is unrelated to the current discussion and the old content shows up out of nowhere

## Do not remind (should_remind: false) when
- it is part of an ongoing discussion of the same topic in the recent messages
- a new topic has started and the message is not a repeat within it
- it explicitly replies to, quotes or extends the earlier message
- it is echoing, a chain or a running joke
- it adds new information (a follow-up, a different angle)
- it only mentions a user ("@name", "@name ?") or is a short reply to one ("@name ok")

## Notes
- Many people post a plain image or text without any exclamation.
- The key question is whether the sender knows this was already discussed.
- With no related discussion in the current context and a long gap, it is most likely an unaware repost.

## Output
Give a short analysis, then output JSON:

```json
{{
    "should_remind": true,
    "reason": "why"
}}
```"#;

/// Formats a timestamp as `MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor() as i64;
    let nanos = ((timestamp - timestamp.floor()) * 1e9) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) if timestamp > 0.0 => dt.format("%m-%d %H:%M:%S").to_string(),
        _ => "??:??:??".to_string(),
    }
}

/// One context line: `[MM-DD HH:MM:SS] name: content`.
pub fn format_context_line(sender_name: &str, content: &str, timestamp: f64) -> String {
    format!("[{}] {}: {}", format_timestamp(timestamp), sender_name, content)
}

/// Relative age of `timestamp` at `now`: "N seconds/minutes/hours/days ago".
pub fn format_time_ago(now: f64, timestamp: f64) -> String {
    let diff = (now - timestamp).max(0.0);
    if diff < 60.0 {
        format!("{} seconds ago", diff as u64)
    } else if diff < 3600.0 {
        format!("{} minutes ago", (diff / 60.0) as u64)
    } else if diff < 86400.0 {
        format!("{} hours ago", (diff / 3600.0) as u64)
    } else {
        format!("{} days ago", (diff / 86400.0) as u64)
    }
}

/// Values substituted into the judgment template.
#[derive(Debug, Clone, Default)]
pub struct JudgePromptVars {
    pub unique_count: usize,
    pub min_senders: usize,
    pub matched_time: String,
    pub matched_time_ago: String,
    pub matched_sender: String,
    /// Full matched content; truncated to [`MATCHED_CONTENT_PREVIEW_CHARS`] when rendered.
    pub matched_content: String,
    pub history_lines: Vec<String>,
    pub current_lines: Vec<String>,
    pub sender_name: String,
    pub content: String,
}

impl JudgePromptVars {
    fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("unique_count", self.unique_count.to_string()),
            ("min_senders", self.min_senders.to_string()),
            ("matched_time", self.matched_time.clone()),
            ("matched_time_ago", self.matched_time_ago.clone()),
            ("matched_sender", self.matched_sender.clone()),
            (
                "matched_content",
                self.matched_content
                    .chars()
                    .take(MATCHED_CONTENT_PREVIEW_CHARS)
                    .collect(),
            ),
            ("history_str", self.history_lines.join("\n")),
            ("current_str", self.current_lines.join("\n")),
            ("sender_name", self.sender_name.clone()),
            ("content", self.content.clone()),
        ]
    }

    /// Renders `template` with these values.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        render_template(template, &self.bindings())
    }

    /// Renders `custom` if given and valid, otherwise [`DEFAULT_JUDGE_PROMPT`].
    ///
    /// Returns the prompt and the template error that forced the fallback, if any.
    pub fn render_or_default(&self, custom: Option<&str>) -> (String, Option<TemplateError>) {
        let mut fallback_reason = None;
        if let Some(template) = custom {
            match self.render(template) {
                Ok(prompt) => return (prompt, None),
                Err(e) => fallback_reason = Some(e),
            }
        }
        let prompt = self
            .render(DEFAULT_JUDGE_PROMPT)
            .unwrap_or_else(|_| DEFAULT_JUDGE_PROMPT.to_string());
        (prompt, fallback_reason)
    }
}
