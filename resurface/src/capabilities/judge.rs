//! Judgment capability: decide whether a resurfaced post deserves a reminder.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use llm_client::LlmClient;
use prompt::{format_context_line, format_time_ago, format_timestamp, ChatMessage, JudgePromptVars};
use tracing::{debug, instrument, warn};

use super::json_reply::{lenient_bool, parse_object};
use crate::matching::ContextLine;

/// Everything the judge sees. No fingerprints.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    pub content: String,
    pub sender_name: String,
    pub matched: ContextLine,
    /// Context around the matched record.
    pub history: Vec<ContextLine>,
    /// Most recent messages before the new one.
    pub recent: Vec<ContextLine>,
    pub unique_senders: usize,
    pub min_senders: usize,
    pub now: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub should_remind: bool,
    pub reason: String,
}

#[async_trait]
pub trait JudgeCapability: Send + Sync {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment>;
}

/// Parses `{"should_remind": bool, "reason": string}` from a reply (fenced or inline).
pub fn parse_judgment(reply: &str) -> Result<Judgment> {
    let obj = parse_object(reply).ok_or_else(|| anyhow!("judgment reply has no JSON object"))?;
    let should_remind = obj
        .get("should_remind")
        .and_then(lenient_bool)
        .ok_or_else(|| anyhow!("judgment reply has no should_remind flag"))?;
    let reason = obj
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or_default()
        .to_string();
    Ok(Judgment {
        should_remind,
        reason,
    })
}

fn lines(ctx: &[ContextLine]) -> Vec<String> {
    ctx.iter()
        .map(|c| format_context_line(&c.sender_name, &c.content, c.timestamp))
        .collect()
}

/// Builds the judgment prompt variables for a request.
pub fn prompt_vars(request: &JudgeRequest) -> JudgePromptVars {
    JudgePromptVars {
        unique_count: request.unique_senders,
        min_senders: request.min_senders,
        matched_time: format_timestamp(request.matched.timestamp),
        matched_time_ago: format_time_ago(request.now, request.matched.timestamp),
        matched_sender: request.matched.sender_name.clone(),
        matched_content: request.matched.content.clone(),
        history_lines: lines(&request.history),
        current_lines: lines(&request.recent),
        sender_name: request.sender_name.clone(),
        content: request.content.clone(),
    }
}

/// Judgment over an OpenAI-compatible chat model.
pub struct LlmJudge {
    client: Arc<dyn LlmClient>,
    template: Option<String>,
}

impl LlmJudge {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            template: None,
        }
    }

    /// Custom prompt template; an unrenderable template falls back to the default per call.
    pub fn with_template(mut self, template: Option<String>) -> Self {
        self.template = template.filter(|t| !t.trim().is_empty());
        self
    }
}

#[async_trait]
impl JudgeCapability for LlmJudge {
    #[instrument(skip(self, request), fields(model = %self.client.model(), unique_senders = request.unique_senders))]
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment> {
        let (prompt, fallback) = prompt_vars(request).render_or_default(self.template.as_deref());
        if let Some(e) = fallback {
            warn!(error = %e, "Custom judgment template invalid, using default");
        }
        let reply = self.client.complete(vec![ChatMessage::user(prompt)]).await?;
        let judgment = parse_judgment(&reply)?;
        debug!(
            should_remind = judgment.should_remind,
            reason = %judgment.reason,
            "step: judgment reply parsed"
        );
        Ok(judgment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_judgment() {
        let reply = "The user seems unaware.\n```json\n{\n  \"should_remind\": true,\n  \"reason\": \"unaware repost\"\n}\n```";
        let j = parse_judgment(reply).unwrap();
        assert!(j.should_remind);
        assert_eq!(j.reason, "unaware repost");
    }

    #[test]
    fn test_unparsable_judgment_is_error() {
        assert!(parse_judgment("should_remind: true").is_err());
        assert!(parse_judgment("{\"reason\": \"missing flag\"}").is_err());
    }

    #[test]
    fn test_prompt_vars_format_context() {
        let request = JudgeRequest {
            content: "metro closed again".to_string(),
            sender_name: "dave".to_string(),
            matched: ContextLine {
                sender_name: "alice".to_string(),
                content: "metro closed".to_string(),
                timestamp: 1_709_287_205.0,
            },
            history: vec![ContextLine {
                sender_name: "alice".to_string(),
                content: "metro closed".to_string(),
                timestamp: 1_709_287_205.0,
            }],
            recent: vec![],
            unique_senders: 3,
            min_senders: 3,
            now: 1_709_287_205.0 + 7200.0,
        };
        let vars = prompt_vars(&request);
        assert_eq!(vars.matched_time_ago, "2 hours ago");
        assert_eq!(vars.history_lines, vec!["[03-01 10:00:05] alice: metro closed"]);
        assert!(vars.current_lines.is_empty());
    }
}
