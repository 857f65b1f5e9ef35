//! Suggestion session: the orchestration engine
//!
//! One `Session` owns the document, the configuration, and both suggestion
//! lists, and is the only thing the surrounding host mutates. It is an
//! explicit state machine plus reducer: every external happening (keystroke,
//! config change, review click, oracle response) is a `SessionEvent`, and
//! `handle` returns the `Effect`s the host must perform: oracle fetches to
//! spawn and notices to show. The reducer itself never blocks and never
//! touches the network, so any host (CLI, tests) can drive it.
//!
//! Staleness is handled by epoch comparison: the epoch is bumped on every
//! document or config change, captured into each fetch effect, and carried
//! back on the response event. A response whose epoch no longer matches is
//! dropped without touching any state.

pub mod review;

pub use review::ReviewState;

use crate::locate;
use crate::oracle::{OracleError, OracleRequest, Scope};
use crate::patch;
use crate::suggest::exclusions::ExclusionRegistry;
use crate::suggest::{sanitize_batch, Suggestion, SuggestionKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The two textual-structure conventions the oracle can be held to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    /// Free verse: line lengths and stanza shapes vary freely
    #[default]
    Loose,
    /// Fixed form: consistent meter and stanza structure
    Strict,
}

impl StructureKind {
    pub fn label(&self) -> &'static str {
        match self {
            StructureKind::Loose => "loose",
            StructureKind::Strict => "strict",
        }
    }
}

/// Writer-chosen configuration. Any change invalidates all pending and
/// displayed suggestions: they were computed under a stale configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Free-form tone label, e.g. "Melancholic"
    pub tone: String,
    pub structure: StructureKind,
    pub enforce_rhyme: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tone: "Neutral".to_string(),
            structure: StructureKind::Loose,
            enforce_rhyme: false,
        }
    }
}

/// User-visible, non-fatal outcomes the host should surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Review requested on an empty document; no oracle call was made
    EmptyDocument,
    /// An oracle fetch failed; nothing was applied
    OracleFailed(String),
    /// The suggestion's original span no longer occurs in the document
    SuggestionObsolete(String),
    /// Resuggest produced nothing new for this span
    NoFurtherAlternatives(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyDocument => write!(f, "Nothing to review yet - write something first"),
            Notice::OracleFailed(e) => write!(f, "Suggestion fetch failed: {}", e),
            Notice::SuggestionObsolete(original) => {
                write!(f, "\"{}\" no longer appears in the document", original)
            }
            Notice::NoFurtherAlternatives(original) => {
                write!(f, "No further alternatives for \"{}\"", original)
            }
        }
    }
}

/// Everything that can happen to a session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The editor replaced the document text
    DocumentEdited(String),
    ConfigChanged(SessionConfig),
    /// Explicit "generate" action (or the debouncer firing in continuous mode)
    ReviewRequested,
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
    /// Accept the spotlighted grammar suggestion
    AcceptActive,
    /// Dismiss the spotlighted grammar suggestion
    DismissActive,
    /// Ask for a fresh alternative to the spotlighted grammar suggestion
    ResuggestActive,
    AcceptTone { original: String },
    DismissTone { original: String },
    ResuggestTone { original: String },
    /// Toggle one token of a suggestion's correction in the exclusion set
    ToggleWordExclusion { original: String, word: String },
}

/// Work the host must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchGrammar {
        epoch: u64,
        request: OracleRequest,
    },
    FetchTone {
        epoch: u64,
        request: OracleRequest,
    },
    FetchAlternative {
        epoch: u64,
        original: String,
        kind: SuggestionKind,
        request: OracleRequest,
    },
    Notify(Notice),
}

/// What survives across program runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub document: String,
    pub config: SessionConfig,
}

/// The aggregate root. Owned and mutated exclusively by the orchestration
/// engine; the host edits the document and config only through events, which
/// route through the invalidation path.
#[derive(Debug, Default)]
pub struct Session {
    document: String,
    config: SessionConfig,
    grammar: Vec<Suggestion>,
    tone: Vec<Suggestion>,
    state: ReviewState,
    epoch: u64,
    exclusions: ExclusionRegistry,
}

impl Session {
    pub fn new(document: String, config: SessionConfig) -> Self {
        Self {
            document,
            config,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self::new(snapshot.document, snapshot.config)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            document: self.document.clone(),
            config: self.config.clone(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn grammar_suggestions(&self) -> &[Suggestion] {
        &self.grammar
    }

    pub fn tone_suggestions(&self) -> &[Suggestion] {
        &self.tone
    }

    /// The grammar suggestion currently spotlighted for sequential review
    pub fn active_grammar(&self) -> Option<&Suggestion> {
        self.grammar.get(self.state.active_index()?)
    }

    /// The tone suggestion under the editor cursor, for the free review surface
    pub fn tone_at_cursor(&self, cursor: usize) -> Option<&Suggestion> {
        locate::suggestion_at_cursor(&self.document, cursor, &self.tone)
    }

    /// Excluded phrasings recorded for a span
    pub fn excluded_phrases(&self, original: &str) -> &[String] {
        self.exclusions.phrases_for(original)
    }

    /// Apply one event and return the effects the host must perform
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::DocumentEdited(text) => self.edit_document(text),
            SessionEvent::ConfigChanged(config) => self.change_config(config),
            SessionEvent::ReviewRequested => self.request_review(),
            SessionEvent::GrammarBatch { epoch, outcome } => {
                self.on_grammar_batch(epoch, outcome)
            }
            SessionEvent::ToneBatch { epoch, outcome } => self.on_tone_batch(epoch, outcome),
            SessionEvent::AlternativeReady {
                epoch,
                original,
                kind,
                outcome,
            } => self.on_alternative(epoch, original, kind, outcome),
            SessionEvent::AcceptActive => self.accept_active(),
            SessionEvent::DismissActive => self.dismiss_active(),
            SessionEvent::ResuggestActive => self.resuggest_active(),
            SessionEvent::AcceptTone { original } => self.accept_tone(&original),
            SessionEvent::DismissTone { original } => self.dismiss_tone(&original),
            SessionEvent::ResuggestTone { original } => self.resuggest_tone(&original),
            SessionEvent::ToggleWordExclusion { original, word } => {
                self.toggle_word(&original, &word)
            }
        }
    }

    // ---- document / config -------------------------------------------------

    fn edit_document(&mut self, text: String) -> Vec<Effect> {
        if text == self.document {
            return Vec::new();
        }
        self.document = text;
        self.invalidate();
        Vec::new()
    }

    fn change_config(&mut self, config: SessionConfig) -> Vec<Effect> {
        if config == self.config {
            return Vec::new();
        }
        self.config = config;
        self.invalidate();
        Vec::new()
    }

    /// The moving-target rule: any edit invalidates everything. In-flight
    /// oracle calls are left to complete; the epoch bump orphans them.
    fn invalidate(&mut self) {
        self.epoch += 1;
        self.grammar.clear();
        self.tone.clear();
        self.state = ReviewState::Idle;
        self.prune_exclusions();
    }

    // ---- fetching ----------------------------------------------------------

    fn request_review(&mut self) -> Vec<Effect> {
        if !self.state.is_idle() {
            return Vec::new();
        }
        if self.document.trim().is_empty() {
            return vec![Effect::Notify(Notice::EmptyDocument)];
        }
        self.state = ReviewState::FetchingGrammar;
        vec![Effect::FetchGrammar {
            epoch: self.epoch,
            request: self.document_request(Scope::Grammar),
        }]
    }

    fn on_grammar_batch(
        &mut self,
        epoch: u64,
        outcome: Result<Vec<Suggestion>, OracleError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || self.state != ReviewState::FetchingGrammar {
            return Vec::new();
        }
        match outcome {
            Ok(batch) => {
                let batch: Vec<Suggestion> = batch
                    .into_iter()
                    .filter(|s| s.kind == SuggestionKind::Grammar)
                    .collect();
                let clean = sanitize_batch(batch, &self.document);
                if clean.is_empty() {
                    self.start_tone_fetch()
                } else {
                    self.grammar = clean;
                    self.state = ReviewState::ReviewingGrammar { index: 0 };
                    Vec::new()
                }
            }
            Err(e) => {
                self.state = ReviewState::Idle;
                vec![Effect::Notify(Notice::OracleFailed(e.to_string()))]
            }
        }
    }

    fn on_tone_batch(
        &mut self,
        epoch: u64,
        outcome: Result<Vec<Suggestion>, OracleError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || self.state != ReviewState::FetchingTone {
            return Vec::new();
        }
        match outcome {
            Ok(batch) => {
                let batch: Vec<Suggestion> = batch
                    .into_iter()
                    .filter(|s| s.kind == SuggestionKind::Tone)
                    .collect();
                self.tone = sanitize_batch(batch, &self.document);
                // Empty is a valid terminal display state: "nothing to improve"
                self.state = ReviewState::ReviewingTone;
                Vec::new()
            }
            Err(e) => {
                self.state = ReviewState::Idle;
                vec![Effect::Notify(Notice::OracleFailed(e.to_string()))]
            }
        }
    }

    /// Grammar review is done: clear the list and go after tone. The tone
    /// fetch sees the grammar-clean document under the current epoch.
    fn start_tone_fetch(&mut self) -> Vec<Effect> {
        self.grammar.clear();
        self.prune_exclusions();
        self.state = ReviewState::FetchingTone;
        vec![Effect::FetchTone {
            epoch: self.epoch,
            request: self.document_request(Scope::Tone),
        }]
    }

    // ---- sequential grammar review -----------------------------------------

    fn accept_active(&mut self) -> Vec<Effect> {
        let ReviewState::ReviewingGrammar { index } = self.state else {
            return Vec::new();
        };
        let Some(sug) = self.grammar.get(index).cloned() else {
            return Vec::new();
        };

        match patch::apply_correction(&self.document, &sug.original_text, &sug.corrected_text) {
            Some(updated) => {
                self.document = updated;
                // The document changed, so any in-flight response is stale now
                self.epoch += 1;
                self.exclusions.clear(&sug.original_text);
                self.drop_invalid_unreviewed(index);
                // revalidation can drop keys besides the accepted one
                self.prune_exclusions();
                self.advance_from(index)
            }
            None => {
                self.grammar.remove(index);
                self.prune_exclusions();
                let mut effects =
                    vec![Effect::Notify(Notice::SuggestionObsolete(sug.original_text))];
                effects.extend(self.settle_cursor(index));
                effects
            }
        }
    }

    fn dismiss_active(&mut self) -> Vec<Effect> {
        let ReviewState::ReviewingGrammar { index } = self.state else {
            return Vec::new();
        };
        self.advance_from(index)
    }

    fn resuggest_active(&mut self) -> Vec<Effect> {
        let ReviewState::ReviewingGrammar { index } = self.state else {
            return Vec::new();
        };
        let Some(sug) = self.grammar.get(index).cloned() else {
            return Vec::new();
        };
        self.exclusions
            .record(&sug.original_text, &sug.corrected_text);
        vec![Effect::FetchAlternative {
            epoch: self.epoch,
            original: sug.original_text.clone(),
            kind: SuggestionKind::Grammar,
            request: self.span_request(&sug.original_text, Scope::Grammar),
        }]
    }

    /// A patch can swallow text later suggestions were addressed to. Drop
    /// those; the already-reviewed prefix stays so the cursor keeps meaning.
    fn drop_invalid_unreviewed(&mut self, current: usize) {
        let document = std::mem::take(&mut self.document);
        let mut position = 0;
        self.grammar.retain(|s| {
            let keep = position <= current || document.contains(&s.original_text);
            position += 1;
            keep
        });
        self.document = document;
    }

    /// Move the spotlight past `index`; entering tone review when the list
    /// is exhausted.
    fn advance_from(&mut self, index: usize) -> Vec<Effect> {
        let next = index + 1;
        if next >= self.grammar.len() {
            self.start_tone_fetch()
        } else {
            self.state = ReviewState::ReviewingGrammar { index: next };
            Vec::new()
        }
    }

    /// After removing the suggestion at `index`, the same index already
    /// points at its successor.
    fn settle_cursor(&mut self, index: usize) -> Vec<Effect> {
        if index >= self.grammar.len() {
            self.start_tone_fetch()
        } else {
            self.state = ReviewState::ReviewingGrammar { index };
            Vec::new()
        }
    }

    // ---- free tone review --------------------------------------------------

    fn accept_tone(&mut self, original: &str) -> Vec<Effect> {
        if self.state != ReviewState::ReviewingTone {
            return Vec::new();
        }
        let Some(pos) = self.tone.iter().position(|s| s.original_text == original) else {
            return Vec::new();
        };
        let sug = self.tone[pos].clone();

        let mut effects = Vec::new();
        match patch::apply_correction(&self.document, &sug.original_text, &sug.corrected_text) {
            Some(updated) => {
                self.document = updated;
                self.epoch += 1;
                self.tone.remove(pos);
                let document = std::mem::take(&mut self.document);
                patch::retain_valid(&mut self.tone, &document);
                self.document = document;
            }
            None => {
                self.tone.remove(pos);
                effects.push(Effect::Notify(Notice::SuggestionObsolete(
                    sug.original_text.clone(),
                )));
            }
        }
        self.prune_exclusions();
        if self.tone.is_empty() {
            self.state = ReviewState::Idle;
        }
        effects
    }

    fn dismiss_tone(&mut self, original: &str) -> Vec<Effect> {
        if self.state != ReviewState::ReviewingTone {
            return Vec::new();
        }
        self.tone.retain(|s| s.original_text != original);
        self.prune_exclusions();
        if self.tone.is_empty() {
            self.state = ReviewState::Idle;
        }
        Vec::new()
    }

    fn resuggest_tone(&mut self, original: &str) -> Vec<Effect> {
        if self.state != ReviewState::ReviewingTone {
            return Vec::new();
        }
        let Some(sug) = self
            .tone
            .iter()
            .find(|s| s.original_text == original)
            .cloned()
        else {
            return Vec::new();
        };
        self.exclusions
            .record(&sug.original_text, &sug.corrected_text);
        vec![Effect::FetchAlternative {
            epoch: self.epoch,
            original: sug.original_text.clone(),
            kind: SuggestionKind::Tone,
            request: self.span_request(&sug.original_text, Scope::Tone),
        }]
    }

    // ---- resuggestion ------------------------------------------------------

    fn on_alternative(
        &mut self,
        epoch: u64,
        original: String,
        kind: SuggestionKind,
        outcome: Result<Option<Suggestion>, OracleError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch {
            return Vec::new();
        }
        let pos = self
            .list(kind)
            .iter()
            .position(|s| s.original_text == original);
        // The span left review while the call was in flight; resolve silently
        let Some(pos) = pos else {
            return Vec::new();
        };
        match outcome {
            Err(e) => vec![Effect::Notify(Notice::OracleFailed(e.to_string()))],
            Ok(None) => vec![Effect::Notify(Notice::NoFurtherAlternatives(original))],
            Ok(Some(mut fresh)) => {
                // Identity is the span: the replacement keeps the key even if
                // the oracle echoed it imperfectly.
                fresh.original_text = original.clone();
                fresh.kind = kind;
                // Oracle misbehavior (repeating an excluded phrase) is not
                // auto-corrected; recording keeps it excluded next round.
                self.exclusions.record(&original, &fresh.corrected_text);
                self.list_mut(kind)[pos] = fresh;
                Vec::new()
            }
        }
    }

    fn toggle_word(&mut self, original: &str, word: &str) -> Vec<Effect> {
        let live = self
            .grammar
            .iter()
            .chain(self.tone.iter())
            .any(|s| s.original_text == original);
        if live {
            self.exclusions.toggle_word(original, word);
        }
        Vec::new()
    }

    // ---- plumbing ----------------------------------------------------------

    fn list(&self, kind: SuggestionKind) -> &[Suggestion] {
        match kind {
            SuggestionKind::Grammar => &self.grammar,
            SuggestionKind::Tone => &self.tone,
        }
    }

    fn list_mut(&mut self, kind: SuggestionKind) -> &mut [Suggestion] {
        match kind {
            SuggestionKind::Grammar => &mut self.grammar,
            SuggestionKind::Tone => &mut self.tone,
        }
    }

    fn document_request(&self, scope: Scope) -> OracleRequest {
        OracleRequest {
            text: self.document.clone(),
            tone: self.config.tone.clone(),
            structure: self.config.structure,
            enforce_rhyme: self.config.enforce_rhyme,
            scope,
            excluded_phrases: Vec::new(),
        }
    }

    fn span_request(&self, span: &str, scope: Scope) -> OracleRequest {
        OracleRequest {
            text: span.to_string(),
            tone: self.config.tone.clone(),
            structure: self.config.structure,
            enforce_rhyme: self.config.enforce_rhyme,
            scope,
            excluded_phrases: self.exclusions.phrases_for(span).to_vec(),
        }
    }

    fn prune_exclusions(&mut self) {
        let live: HashSet<&str> = self
            .grammar
            .iter()
            .chain(self.tone.iter())
            .map(|s| s.original_text.as_str())
            .collect();
        self.exclusions.prune(&live);
    }
}
