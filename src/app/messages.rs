//! Messages sent from background oracle tasks to the host loop

use crate::oracle::OracleError;
use crate::suggest::{Suggestion, SuggestionKind};

/// Results flowing back from spawned oracle calls. Each carries the epoch
/// captured when the request was built; the session drops mismatches.
#[derive(Debug)]
pub enum BackgroundMessage {
    GrammarBatch {
        epoch: u64,
        outcome: Result<Vec<Suggestion>, OracleError>,
    },
    ToneBatch {
        epoch: u64,
        outcome: Result<Vec<Suggestion>, OracleError>,
    },
    AlternativeReady {
        epoch: u64,
        original: String,
        kind: SuggestionKind,
        outcome: Result<Option<Suggestion>, OracleError>,
    },
    /// A background task crashed; surfaced as a notice, never a panic
    Error(String),
}
