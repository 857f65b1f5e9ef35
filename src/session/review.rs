//! Review state machine
//!
//! Grammar strictly gates tone: the machine fetches and walks grammar
//! corrections one at a time, and only once that list is exhausted does it
//! fetch tone suggestions, which are reviewed as a free list. Sequential and
//! free review share one shape, a list with an optional spotlight index
//! that is unset in the free mode.

/// The current phase of a review pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewState {
    /// No suggestions pending
    #[default]
    Idle,
    /// Grammar-scope oracle call in flight for the full document
    FetchingGrammar,
    /// Presenting grammar suggestion `index` as the sole active suggestion
    ReviewingGrammar { index: usize },
    /// Tone-scope oracle call in flight for the grammar-clean document
    FetchingTone,
    /// Tone suggestions presented as a free reviewable list
    ReviewingTone,
}

impl ReviewState {
    /// Human-readable status for display
    pub fn status_text(&self) -> &'static str {
        match self {
            ReviewState::Idle => "Ready",
            ReviewState::FetchingGrammar => "Checking grammar...",
            ReviewState::ReviewingGrammar { .. } => "Reviewing grammar",
            ReviewState::FetchingTone => "Checking tone...",
            ReviewState::ReviewingTone => "Reviewing tone",
        }
    }

    /// The spotlight index during sequential grammar review
    pub fn active_index(&self) -> Option<usize> {
        match self {
            ReviewState::ReviewingGrammar { index } => Some(*index),
            _ => None,
        }
    }

    /// An oracle call is in flight for this state
    pub fn is_fetching(&self) -> bool {
        matches!(
            self,
            ReviewState::FetchingGrammar | ReviewState::FetchingTone
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ReviewState::Idle)
    }
}
