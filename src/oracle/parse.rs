//! Parsing of oracle responses
//!
//! Model output is JSON by contract but dirty in practice: markdown fences,
//! smart quotes, trailing commas, prose around the payload. Repair the common
//! cases before giving up; a response that still fails to parse is reported
//! as `Malformed` rather than dropped silently.

use super::OracleError;
use crate::suggest::{Suggestion, SuggestionKind};
use serde::Deserialize;

#[derive(Deserialize)]
struct SuggestionJson {
    original: String,
    corrected: String,
    #[serde(default)]
    explanation: String,
}

/// Strip markdown code fences from a response
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

/// Extract a JSON fragment between matching delimiters
fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Fix common JSON issues from model responses
fn fix_json_issues(json: &str) -> String {
    let mut fixed = json.to_string();

    // Trailing commas before ] or }
    fixed = fixed.replace(",]", "]");
    fixed = fixed.replace(",}", "}");

    // Smart quotes to regular quotes
    fixed = fixed.replace(['\u{201C}', '\u{201D}'], "\"");
    fixed = fixed.replace(['\u{2018}', '\u{2019}'], "'");

    // Control characters that slipped in
    fixed
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Parse a batch of suggestions from a raw model response.
///
/// Accepts a bare array or an object wrapping one under a "suggestions" key
/// (JSON mode sometimes insists on an object). An empty array is a valid
/// response meaning "no issues found".
pub fn parse_batch(response: &str, kind: SuggestionKind) -> Result<Vec<Suggestion>, OracleError> {
    let clean = fix_json_issues(strip_markdown_fences(response));

    let json_str = if let Some(array) = extract_json_fragment(&clean, '[', ']') {
        array.to_string()
    } else if let Some(obj) = extract_json_fragment(&clean, '{', '}') {
        match serde_json::from_str::<serde_json::Value>(obj) {
            Ok(value) => match value.get("suggestions") {
                Some(inner) => serde_json::to_string(inner)
                    .map_err(|e| OracleError::Malformed(e.to_string()))?,
                None => obj.to_string(),
            },
            Err(_) => obj.to_string(),
        }
    } else {
        return Err(OracleError::Malformed(format!(
            "no JSON payload in response: {}",
            preview(&clean)
        )));
    };

    let parsed: Vec<SuggestionJson> = serde_json::from_str(&json_str)
        .or_else(|_| serde_json::from_str(&fix_json_issues(&json_str)))
        .map_err(|e| {
            OracleError::Malformed(format!("{} (response: {})", e, preview(&json_str)))
        })?;

    Ok(parsed
        .into_iter()
        .map(|s| Suggestion::new(s.original, s.corrected, s.explanation, kind))
        .collect())
}

fn preview(s: &str) -> String {
    let mut p: String = s.chars().take(160).collect();
    if p.len() < s.len() {
        p.push('…');
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let response = r#"[{"original":"Eu gosta","corrected":"Eu gosto","explanation":"Verb agreement"}]"#;
        let batch = parse_batch(response, SuggestionKind::Grammar).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].original_text, "Eu gosta");
        assert_eq!(batch[0].corrected_text, "Eu gosto");
        assert_eq!(batch[0].kind, SuggestionKind::Grammar);
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = "```json\n[{\"original\":\"a\",\"corrected\":\"b\"}]\n```";
        let batch = parse_batch(response, SuggestionKind::Tone).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].explanation, "");
    }

    #[test]
    fn test_parse_object_wrapper() {
        let response = r#"{"suggestions":[{"original":"x","corrected":"y","explanation":"z"}]}"#;
        let batch = parse_batch(response, SuggestionKind::Tone).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_parse_empty_array_is_valid() {
        let batch = parse_batch("[]", SuggestionKind::Grammar).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_parse_trailing_comma_repaired() {
        let response = r#"[{"original":"a","corrected":"b","explanation":"c"},]"#;
        let batch = parse_batch(response, SuggestionKind::Grammar).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_parse_prose_is_malformed() {
        let err = parse_batch("I could not find any issues.", SuggestionKind::Tone).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn test_smart_quotes_repaired() {
        let response = "[{\u{201C}original\u{201D}:\u{201C}a\u{201D},\u{201C}corrected\u{201D}:\u{201C}b\u{201D}}]";
        let batch = parse_batch(response, SuggestionKind::Tone).unwrap();
        assert_eq!(batch[0].original_text, "a");
    }
}
