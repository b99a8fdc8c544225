//! Reading structured completion output.
//!
//! Model output is untrusted: it may be wrapped in markdown fences, padded
//! with prose, or carry fields of the wrong type. Nothing here assumes a field
//! exists; callers apply their own defaults.

use serde_json::{Map, Value};

/// Locate a JSON object in the response text.
///
/// A fenced block (```json or a bare ```) is searched first; otherwise the
/// whole response is. Either way the first complete `{...}` wins, so prose
/// before or after the object is ignored.
pub fn extract_json_object(response: &str) -> Option<&str> {
    fenced_body(response)
        .and_then(first_object)
        .or_else(|| first_object(response))
}

/// Body of the first closed code fence, minus its language tag line.
fn fenced_body(response: &str) -> Option<&str> {
    let open = response.find("```")?;
    let after_tag = &response[open + 3..];
    let body = &after_tag[after_tag.find('\n')? + 1..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// First brace-balanced object in `text`. Braces inside string literals
/// don't count.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let tail = &text[start..];
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in tail.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&tail[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the response into a JSON object map, or describe why it can't be.
pub fn parse_object(response: &str) -> Result<Map<String, Value>, String> {
    let json_str = extract_json_object(response)
        .ok_or_else(|| "response contains no JSON object".to_string())?;
    match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", kind(&other))),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A non-blank string field. Numbers are accepted and rendered as text since
/// models often emit `"policyNumber": 12345`.
pub fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An ordered list of non-blank strings. A bare string counts as a single
/// item; non-string items are dropped; anything else yields an empty list.
pub fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// A nested object, if present and actually an object.
pub fn object_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    obj.get(key).and_then(Value::as_object)
}

/// True for the placeholder values models use to say "nothing here".
pub fn is_absence_marker(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "none" | "null" | "n/a" | "na"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_json_fence() {
        let response = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json_object(response), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_from_generic_fence() {
        let response = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(response), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_embedded_object_with_braces_in_strings() {
        let response = r#"Result: {"note": "use {curly} braces", "n": {"x": 2}} trailing"#;
        assert_eq!(
            extract_json_object(response),
            Some(r#"{"note": "use {curly} braces", "n": {"x": 2}}"#)
        );
    }

    #[test]
    fn test_object_followed_by_prose_parses() {
        let response = "{\"clientName\": \"Alan\"}\nLet me know if you need anything else.";
        assert_eq!(extract_json_object(response), Some("{\"clientName\": \"Alan\"}"));

        let obj = parse_object(response).expect("object before prose");
        assert_eq!(text_field(&obj, "clientName"), Some("Alan".to_string()));
    }

    #[test]
    fn test_fenced_object_with_trailing_text_inside_fence() {
        let response = "```json\n{\"a\": \"b\\\"}\"}\nDone.\n```";
        let obj = parse_object(response).expect("fenced object");
        assert_eq!(text_field(&obj, "a"), Some("b\"}".to_string()));
    }

    #[test]
    fn test_extract_none_without_object() {
        assert_eq!(extract_json_object("no structure here"), None);
        assert_eq!(extract_json_object("prefix { unterminated"), None);
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object("").is_err());
        assert!(parse_object("{not json}").is_err());
        assert!(parse_object("```json\n[1, 2]\n```").is_err());
        assert!(parse_object("{}").unwrap().is_empty());
    }

    #[test]
    fn test_text_field_handles_types() {
        let obj = parse_object(r#"{"a": "  x ", "b": "", "c": 42, "d": null, "e": ["x"]}"#).unwrap();
        assert_eq!(text_field(&obj, "a"), Some("x".to_string()));
        assert_eq!(text_field(&obj, "b"), None);
        assert_eq!(text_field(&obj, "c"), Some("42".to_string()));
        assert_eq!(text_field(&obj, "d"), None);
        assert_eq!(text_field(&obj, "e"), None);
        assert_eq!(text_field(&obj, "missing"), None);
    }

    #[test]
    fn test_list_field_is_lenient() {
        let obj = parse_object(
            r#"{"goals": ["Retire at 65", 3, "", "Lexus upgrade"], "risks": "Back problems", "bad": {"x": 1}}"#,
        )
        .unwrap();
        assert_eq!(list_field(&obj, "goals"), vec!["Retire at 65", "Lexus upgrade"]);
        assert_eq!(list_field(&obj, "risks"), vec!["Back problems"]);
        assert!(list_field(&obj, "bad").is_empty());
        assert!(list_field(&obj, "missing").is_empty());
    }

    #[test]
    fn test_absence_markers() {
        assert!(is_absence_marker("None"));
        assert!(is_absence_marker(" null "));
        assert!(!is_absence_marker("OPENER\nHello"));
    }
}
