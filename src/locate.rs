//! Cursor-to-suggestion mapping
//!
//! Used by the free-form review surfaces: given the editor's cursor offset,
//! find the suggestion whose original span contains it. Spans are located via
//! first-occurrence search, same policy as the patcher. The sequential
//! grammar reviewer never consults the cursor; its active suggestion is
//! determined purely by the review index.

use crate::suggest::Suggestion;

/// Find the suggestion whose span contains `cursor`, a char offset into
/// `document`. Both span boundaries are inclusive, so a cursor sitting just
/// after the last character still counts as inside.
pub fn suggestion_at_cursor<'a>(
    document: &str,
    cursor: usize,
    suggestions: &'a [Suggestion],
) -> Option<&'a Suggestion> {
    suggestions.iter().find(|s| {
        let Some(byte_start) = document.find(&s.original_text) else {
            return false;
        };
        let start = document[..byte_start].chars().count();
        let len = s.original_text.chars().count();
        cursor >= start && cursor <= start + len
    })
}

/// The line of `text` containing the char offset `cursor`.
/// A cursor sitting on a newline belongs to the line it terminates.
pub fn current_line(text: &str, cursor: usize) -> &str {
    let mut consumed = 0;
    for line in text.split('\n') {
        let len = line.chars().count();
        if cursor <= consumed + len {
            return line;
        }
        // +1 for the newline
        consumed += len + 1;
    }
    text.split('\n').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::SuggestionKind;

    fn sug(original: &str) -> Suggestion {
        Suggestion::new(original, "fix", "", SuggestionKind::Tone)
    }

    #[test]
    fn test_cursor_inside_span() {
        let doc = "the sad night falls";
        let list = vec![sug("sad night")];
        // "sad night" spans chars 4..=13
        assert!(suggestion_at_cursor(doc, 4, &list).is_some());
        assert!(suggestion_at_cursor(doc, 9, &list).is_some());
        assert!(suggestion_at_cursor(doc, 13, &list).is_some());
        assert!(suggestion_at_cursor(doc, 3, &list).is_none());
        assert!(suggestion_at_cursor(doc, 14, &list).is_none());
    }

    #[test]
    fn test_cursor_with_multibyte_prefix() {
        let doc = "coração e dor";
        let list = vec![sug("dor")];
        // "dor" starts at char 10
        assert!(suggestion_at_cursor(doc, 10, &list).is_some());
        assert!(suggestion_at_cursor(doc, 9, &list).is_none());
    }

    #[test]
    fn test_cursor_span_uses_first_occurrence() {
        let doc = "echo of an echo";
        let list = vec![sug("echo")];
        assert!(suggestion_at_cursor(doc, 2, &list).is_some());
        // second occurrence is not the addressed span
        assert!(suggestion_at_cursor(doc, 12, &list).is_none());
    }

    #[test]
    fn test_missing_span_matches_nothing() {
        let list = vec![sug("gone")];
        assert!(suggestion_at_cursor("still here", 0, &list).is_none());
    }

    #[test]
    fn test_current_line() {
        let text = "first line\nsecond line\nthird";
        assert_eq!(current_line(text, 0), "first line");
        assert_eq!(current_line(text, 10), "first line");
        assert_eq!(current_line(text, 11), "second line");
        assert_eq!(current_line(text, 27), "third");
        assert_eq!(current_line(text, 99), "third");
    }
}
