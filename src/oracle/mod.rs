//! Oracle boundary
//!
//! The oracle is a black box: given document text and configuration it
//! returns a list of suggestions. This module owns the normalized request and
//! failure shapes; `http` talks to the hosted model, `parse` makes sense of
//! what comes back, `prompts` holds the instruction text.

pub mod http;
pub mod parse;
pub mod prompts;

use crate::session::StructureKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which suggestion track(s) a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Grammar,
    Tone,
    Both,
}

/// Normalized oracle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Text under analysis: the full document, or a single span on resuggest
    pub text: String,
    pub tone: String,
    pub structure: StructureKind,
    pub enforce_rhyme: bool,
    pub scope: Scope,
    /// Phrasings the oracle must not propose again
    pub excluded_phrases: Vec<String>,
}

/// Failure modes surfaced to the orchestration layer.
///
/// None of these corrupt session state: `Unavailable` is retryable by user
/// action, `Malformed` and `Network` degrade to an empty result with a
/// notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle response malformed: {0}")]
    Malformed(String),
    #[error("network error: {0}")]
    Network(String),
}
