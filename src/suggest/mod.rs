//! Suggestion model for Versecraft
//!
//! The oracle never returns positions, so a suggestion's `original_text` is
//! its identity key: a verbatim substring of the document it proposes to
//! replace. Within one list duplicates are filtered, first occurrence wins.

pub mod exclusions;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which review track a suggestion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionKind {
    /// Grammar and structure corrections, reviewed one at a time
    Grammar,
    /// Tone and style improvements, reviewed as a free list
    Tone,
}

impl SuggestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionKind::Grammar => "grammar",
            SuggestionKind::Tone => "tone",
        }
    }
}

/// One proposed edit to the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Verbatim substring of the document this suggestion targets.
    /// Doubles as the suggestion's identity key.
    pub original_text: String,
    /// Proposed replacement for `original_text`
    pub corrected_text: String,
    /// Human-readable rationale
    pub explanation: String,
    pub kind: SuggestionKind,
}

impl Suggestion {
    pub fn new(
        original_text: impl Into<String>,
        corrected_text: impl Into<String>,
        explanation: impl Into<String>,
        kind: SuggestionKind,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            explanation: explanation.into(),
            kind,
        }
    }
}

/// Filter a batch down to one suggestion per original span, first wins.
/// Suggestions whose span does not occur in `document` are dropped too:
/// they reference text that does not exist and could never be applied.
pub fn sanitize_batch(batch: Vec<Suggestion>, document: &str) -> Vec<Suggestion> {
    let mut seen: HashSet<String> = HashSet::new();
    batch
        .into_iter()
        .filter(|s| !s.original_text.is_empty() && document.contains(&s.original_text))
        .filter(|s| seen.insert(s.original_text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_batch_dedupes_first_wins() {
        let doc = "a rose is a rose";
        let batch = vec![
            Suggestion::new("rose", "flower", "first", SuggestionKind::Tone),
            Suggestion::new("rose", "bloom", "second", SuggestionKind::Tone),
        ];
        let clean = sanitize_batch(batch, doc);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].corrected_text, "flower");
    }

    #[test]
    fn test_sanitize_batch_drops_unmatched_spans() {
        let doc = "short poem";
        let batch = vec![
            Suggestion::new("missing line", "x", "", SuggestionKind::Grammar),
            Suggestion::new("", "y", "", SuggestionKind::Grammar),
            Suggestion::new("poem", "verse", "", SuggestionKind::Grammar),
        ];
        let clean = sanitize_batch(batch, doc);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].original_text, "poem");
    }
}
