//! `{placeholder}` template rendering.

use thiserror::Error;

/// Why a template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),

    #[error("single '}}' at byte {0}")]
    UnmatchedClose(usize),
}

/// Substitutes every `{name}` in `template` with the value bound to `name` in `vars`.
///
/// `{{` and `}}` render as literal braces. Placeholder names are trimmed.
pub fn render_template(template: &str, vars: &[(&str, String)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, nc) in chars.by_ref() {
                    if nc == '}' {
                        closed = true;
                        break;
                    }
                    if nc == '{' {
                        break;
                    }
                    name.push(nc);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(pos));
                }
                let name = name.trim();
                let value = vars
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnmatchedClose(pos));
                }
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vec<(&'static str, String)> {
        vec![("name", "Ada".to_string()), ("count", "3".to_string())]
    }

    #[test]
    fn test_substitutes_placeholders() {
        let out = render_template("{name} posted it {count} times", &vars()).unwrap();
        assert_eq!(out, "Ada posted it 3 times");
    }

    #[test]
    fn test_escaped_braces_render_literally() {
        let out = render_template("{{\"n\": {count}}}", &vars()).unwrap();
        assert_eq!(out, "{\"n\": 3}");
    }

    #[test]
    fn test_unknown_placeholder_is_error() {
        let err = render_template("hello {who}", &vars()).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("who".to_string()));
    }

    #[test]
    fn test_unclosed_and_stray_braces_are_errors() {
        assert_eq!(
            render_template("oops {name", &vars()).unwrap_err(),
            TemplateError::Unclosed(5)
        );
        assert_eq!(
            render_template("oops }", &vars()).unwrap_err(),
            TemplateError::UnmatchedClose(5)
        );
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let out = render_template("旧闻 {name} ✓", &vars()).unwrap();
        assert_eq!(out, "旧闻 Ada ✓");
    }
}
