//! Text patching for accepted suggestions
//!
//! Suggestions address text by content, not position, so applying one means
//! finding the original span in the live document. Only the first occurrence
//! is patched; when the span repeats in the document this can pick the wrong
//! one. Known limitation, kept deliberately: context anchoring would change
//! behavior the rest of the engine (and its fixtures) depends on.

use crate::suggest::Suggestion;

/// Byte offset of the first occurrence of `original` in `document`
pub fn first_occurrence(document: &str, original: &str) -> Option<usize> {
    if original.is_empty() {
        return None;
    }
    document.find(original)
}

/// Replace the first occurrence of `original` with `corrected`.
///
/// Returns the patched document, or `None` when the span is not found,
/// meaning the document diverged and the suggestion is obsolete. The caller
/// decides how to surface that; the document is never altered on a miss.
pub fn apply_correction(document: &str, original: &str, corrected: &str) -> Option<String> {
    let start = first_occurrence(document, original)?;
    let mut patched = String::with_capacity(document.len() + corrected.len());
    patched.push_str(&document[..start]);
    patched.push_str(corrected);
    patched.push_str(&document[start + original.len()..]);
    Some(patched)
}

/// Drop every suggestion whose original span no longer occurs in `document`.
/// Run after each successful patch: a correction can swallow text that other
/// suggestions were addressed to.
pub fn retain_valid(suggestions: &mut Vec<Suggestion>, document: &str) {
    suggestions.retain(|s| document.contains(&s.original_text));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::SuggestionKind;

    #[test]
    fn test_apply_correction_first_occurrence_only() {
        let doc = "a rose is a rose is a rose";
        let patched = apply_correction(doc, "a rose", "a lily").unwrap();
        assert_eq!(patched, "a lily is a rose is a rose");
    }

    #[test]
    fn test_apply_correction_preserves_surrounding_text() {
        let doc = "Eu gosta de poesia.";
        let patched = apply_correction(doc, "Eu gosta", "Eu gosto").unwrap();
        assert_eq!(patched, "Eu gosto de poesia.");
    }

    #[test]
    fn test_apply_correction_missing_target_is_noop() {
        assert!(apply_correction("some text", "absent", "x").is_none());
    }

    #[test]
    fn test_apply_correction_empty_original_is_noop() {
        assert!(apply_correction("some text", "", "x").is_none());
    }

    #[test]
    fn test_apply_correction_multibyte_boundaries() {
        let doc = "coração triste à noite";
        let patched = apply_correction(doc, "triste", "sereno").unwrap();
        assert_eq!(patched, "coração sereno à noite");
    }

    #[test]
    fn test_retain_valid_drops_stale_spans() {
        let doc = "the quick fox";
        let mut list = vec![
            Suggestion::new("quick", "swift", "", SuggestionKind::Tone),
            Suggestion::new("lazy dog", "old dog", "", SuggestionKind::Tone),
        ];
        retain_valid(&mut list, doc);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].original_text, "quick");
    }
}
