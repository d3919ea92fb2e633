//! Pulling a JSON object out of a free-form model reply.

/// Body of the first fenced code block (```json preferred), or the whole reply.
pub fn strip_code_fence(reply: &str) -> &str {
    let reply = reply.trim();
    if let Some(start) = reply.find("```json") {
        let rest = &reply[start + "```json".len()..];
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    let mut parts = reply.split("```");
    match (parts.next(), parts.next()) {
        (Some(_), Some(inner)) => inner.trim(),
        _ => reply,
    }
}

/// The outermost `{...}` span of `text`, if any.
pub fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses the reply's JSON object: fenced block first, then the outermost braces.
pub fn parse_object(reply: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let body = strip_code_fence(reply);
    let candidates = [Some(body), outer_object(body), outer_object(reply)];
    candidates
        .into_iter()
        .flatten()
        .find_map(|c| match serde_json::from_str::<serde_json::Value>(c) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        })
}

/// Lenient boolean: JSON bools, and strings "true"/"yes"/"1"/"t" (case-insensitive).
pub fn lenient_bool(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => Some(matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "1" | "t"
        )),
        serde_json::Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("text\n```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_object_finds_embedded_json() {
        let reply = "Analysis: clearly a repost.\n{\"should_remind\": true, \"reason\": \"x\"}";
        let obj = parse_object(reply).unwrap();
        assert_eq!(obj["should_remind"], serde_json::Value::Bool(true));
        assert!(parse_object("no json here").is_none());
    }

    #[test]
    fn test_lenient_bool() {
        assert_eq!(lenient_bool(&serde_json::json!("Yes")), Some(true));
        assert_eq!(lenient_bool(&serde_json::json!("nope")), Some(false));
        assert_eq!(lenient_bool(&serde_json::json!(false)), Some(false));
        assert_eq!(lenient_bool(&serde_json::json!(null)), None);
    }
}
