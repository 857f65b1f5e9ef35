//! Host-side application state
//!
//! Wraps the session with the bits only a running host cares about: the
//! loading indicator for the in-flight channel, the document store, and
//! notice output. All session mutation goes through `background::apply_event`
//! so effects are always performed.

pub mod background;
pub mod messages;

use crate::session::Session;
use crate::store::DocumentStore;

/// Which channel has an oracle call in flight, for display scoping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    None,
    FetchingGrammar,
    FetchingTone,
    Resuggesting,
}

impl LoadingState {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            LoadingState::None => None,
            LoadingState::FetchingGrammar => Some("checking grammar..."),
            LoadingState::FetchingTone => Some("checking tone..."),
            LoadingState::Resuggesting => Some("finding an alternative..."),
        }
    }
}

pub struct App {
    pub session: Session,
    pub loading: LoadingState,
    pub store: Option<DocumentStore>,
}

impl App {
    pub fn new(session: Session, store: Option<DocumentStore>) -> Self {
        Self {
            session,
            loading: LoadingState::None,
            store,
        }
    }

    /// Print a transient notice for the writer
    pub fn note(&self, message: &str) {
        println!("  · {}", message);
    }

    /// Best-effort autosave of the working session
    pub fn autosave(&self) {
        if let Some(store) = &self.store {
            let _ = store.save_session(&self.session.snapshot());
        }
    }
}
