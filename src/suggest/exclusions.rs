//! Exclusion registry for resuggestion
//!
//! Tracks, per original span, the alternatives the writer has already
//! rejected so the oracle is told not to repeat them. Entries accumulate only
//! through explicit resuggest or per-word toggles; they are pruned when the
//! span disappears from both suggestion lists (its correction was accepted or
//! the text no longer appears in the document).

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ExclusionRegistry {
    /// original span -> ordered set of rejected phrases/words
    entries: HashMap<String, Vec<String>>,
}

impl ExclusionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejected phrase for a span. Keeps insertion order, no duplicates.
    pub fn record(&mut self, original: &str, phrase: &str) {
        if phrase.is_empty() {
            return;
        }
        let list = self.entries.entry(original.to_string()).or_default();
        if !list.iter().any(|p| p == phrase) {
            list.push(phrase.to_string());
        }
    }

    /// Toggle a single word in or out of a span's exclusion set.
    /// Returns true if the word is excluded after the call.
    pub fn toggle_word(&mut self, original: &str, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        let list = self.entries.entry(original.to_string()).or_default();
        if let Some(pos) = list.iter().position(|p| p == word) {
            list.remove(pos);
            if list.is_empty() {
                self.entries.remove(original);
            }
            false
        } else {
            list.push(word.to_string());
            true
        }
    }

    /// All excluded phrases for a span, in the order they were rejected
    pub fn phrases_for(&self, original: &str) -> &[String] {
        self.entries.get(original).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, original: &str, phrase: &str) -> bool {
        self.phrases_for(original).iter().any(|p| p == phrase)
    }

    /// Drop the entry for a span whose correction was accepted
    pub fn clear(&mut self, original: &str) {
        self.entries.remove(original);
    }

    /// Drop every entry whose span is no longer a live suggestion key
    pub fn prune(&mut self, live_keys: &HashSet<&str>) {
        self.entries.retain(|key, _| live_keys.contains(key.as_str()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order_and_dedupes() {
        let mut reg = ExclusionRegistry::new();
        reg.record("triste", "soturno");
        reg.record("triste", "sombrio");
        reg.record("triste", "soturno");
        assert_eq!(reg.phrases_for("triste"), ["soturno", "sombrio"]);
    }

    #[test]
    fn test_toggle_word_round_trip() {
        let mut reg = ExclusionRegistry::new();
        assert!(reg.toggle_word("triste", "soturno"));
        assert!(reg.contains("triste", "soturno"));
        assert!(!reg.toggle_word("triste", "soturno"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_prune_drops_dead_keys() {
        let mut reg = ExclusionRegistry::new();
        reg.record("alive", "a");
        reg.record("dead", "b");
        let live: HashSet<&str> = ["alive"].into_iter().collect();
        reg.prune(&live);
        assert_eq!(reg.phrases_for("alive"), ["a"]);
        assert!(reg.phrases_for("dead").is_empty());
    }

    #[test]
    fn test_empty_phrase_ignored() {
        let mut reg = ExclusionRegistry::new();
        reg.record("x", "");
        assert!(reg.is_empty());
    }
}
