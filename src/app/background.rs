//! Background task handling
//!
//! Oracle calls run on spawned tokio tasks and report back over a channel.
//! Channel sends use `let _ =` deliberately: if the receiver is gone the app
//! is shutting down and nobody is listening for the result.

use crate::app::messages::BackgroundMessage;
use crate::app::{App, LoadingState};
use crate::oracle;
use crate::session::{Effect, SessionEvent};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;

/// Feed one event to the session and perform whatever effects come back
pub fn apply_event(app: &mut App, event: SessionEvent, tx: &mpsc::Sender<BackgroundMessage>) {
    let effects = app.session.handle(event);
    perform_effects(app, effects, tx);
}

/// Drain everything the background tasks have produced since last tick
pub fn drain_messages(app: &mut App, rx: &mpsc::Receiver<BackgroundMessage>, tx: &mpsc::Sender<BackgroundMessage>) {
    while let Ok(msg) = rx.try_recv() {
        app.loading = LoadingState::None;
        match msg {
            BackgroundMessage::GrammarBatch { epoch, outcome } => {
                apply_event(app, SessionEvent::GrammarBatch { epoch, outcome }, tx);
            }
            BackgroundMessage::ToneBatch { epoch, outcome } => {
                apply_event(app, SessionEvent::ToneBatch { epoch, outcome }, tx);
            }
            BackgroundMessage::AlternativeReady {
                epoch,
                original,
                kind,
                outcome,
            } => {
                apply_event(
                    app,
                    SessionEvent::AlternativeReady {
                        epoch,
                        original,
                        kind,
                        outcome,
                    },
                    tx,
                );
            }
            BackgroundMessage::Error(e) => {
                app.note(&e);
            }
        }
    }
}

fn perform_effects(app: &mut App, effects: Vec<Effect>, tx: &mpsc::Sender<BackgroundMessage>) {
    for effect in effects {
        match effect {
            Effect::FetchGrammar { epoch, request } => {
                app.loading = LoadingState::FetchingGrammar;
                let tx_result = tx.clone();
                spawn_background(tx.clone(), "grammar_fetch", async move {
                    let outcome = oracle::http::generate(&request).await;
                    let _ = tx_result.send(BackgroundMessage::GrammarBatch { epoch, outcome });
                });
            }
            Effect::FetchTone { epoch, request } => {
                app.loading = LoadingState::FetchingTone;
                let tx_result = tx.clone();
                spawn_background(tx.clone(), "tone_fetch", async move {
                    let outcome = oracle::http::generate(&request).await;
                    let _ = tx_result.send(BackgroundMessage::ToneBatch { epoch, outcome });
                });
            }
            Effect::FetchAlternative {
                epoch,
                original,
                kind,
                request,
            } => {
                app.loading = LoadingState::Resuggesting;
                let tx_result = tx.clone();
                spawn_background(tx.clone(), "resuggest", async move {
                    let outcome = oracle::http::resuggest(&request).await;
                    let _ = tx_result.send(BackgroundMessage::AlternativeReady {
                        epoch,
                        original,
                        kind,
                        outcome,
                    });
                });
            }
            Effect::Notify(notice) => {
                app.note(&notice.to_string());
            }
        }
    }
}

/// Spawn a task whose panic becomes an error message instead of a crash
pub fn spawn_background<F>(tx: mpsc::Sender<BackgroundMessage>, task_name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            let _ = tx.send(BackgroundMessage::Error(format!(
                "Background task '{}' crashed unexpectedly: {}",
                task_name, detail
            )));
        }
    });
}
