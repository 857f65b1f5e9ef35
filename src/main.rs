//! Versecraft CLI
//!
//! A line-based review loop: type to extend the document (auto-review kicks
//! in after a debounce window), `:commands` to drive the review. Grammar
//! corrections are walked one at a time; tone suggestions arrive afterwards
//! as a numbered list.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use versecraft::app::background::{apply_event, drain_messages};
use versecraft::app::messages::BackgroundMessage;
use versecraft::app::{App, LoadingState};
use versecraft::config::{self, Config};
use versecraft::schedule::Debouncer;
use versecraft::session::{
    ReviewState, Session, SessionConfig, SessionEvent, SessionSnapshot, StructureKind,
};
use versecraft::store::DocumentStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StructureArg {
    /// Free verse
    Loose,
    /// Fixed form: consistent meter and stanzas
    Strict,
}

impl From<StructureArg> for StructureKind {
    fn from(value: StructureArg) -> Self {
        match value {
            StructureArg::Loose => StructureKind::Loose,
            StructureArg::Strict => StructureKind::Strict,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "versecraft",
    about = "A writing companion that polishes grammar and tone while you compose",
    version
)]
struct Args {
    /// Text file to seed the document from
    file: Option<PathBuf>,

    /// Intended tone, e.g. "Melancholic"
    #[arg(short, long)]
    tone: Option<String>,

    #[arg(long, value_enum, default_value_t = StructureArg::Loose)]
    structure: StructureArg,

    /// Hold the piece to a rhyme scheme
    #[arg(long)]
    rhyme: bool,

    /// Debounce window for auto-review while typing, in ms (0 disables)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Set up the OpenRouter API key and exit
    #[arg(long)]
    setup: bool,

    /// Resume the autosaved session
    #[arg(long)]
    resume: bool,

    /// List saved documents and exit
    #[arg(long)]
    docs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Timer {
    AutoReview,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.setup {
        config::setup_api_key_interactive()?;
        return Ok(());
    }

    let store = DocumentStore::open_default();

    if args.docs {
        match &store {
            Some(store) => {
                for key in store.list_documents() {
                    println!("{}", key);
                }
            }
            None => eprintln!("No data directory available on this platform"),
        }
        return Ok(());
    }

    let config = Config::load();
    if !config.has_api_key() {
        eprintln!("  No API key configured. Run 'versecraft --setup' to get started.");
    }

    let delay_ms = args.delay_ms.or(config.debounce_ms).unwrap_or(800);
    let session = build_session(&args, &config, store.as_ref())?;
    let mut app = App::new(session, store);

    let (bg_tx, bg_rx) = mpsc::channel::<BackgroundMessage>();
    let line_rx = spawn_stdin_reader();
    let mut debounce: Debouncer<Timer> = Debouncer::new();

    println!("  versecraft · tone: {} · :help for commands", app.session.config().tone);
    if !app.session.document().is_empty() {
        println!("{}", app.session.document());
    }

    let mut last_shown = fingerprint(&app);
    loop {
        drain_messages(&mut app, &bg_rx, &bg_tx);

        if !debounce.poll(Instant::now()).is_empty() {
            apply_event(&mut app, SessionEvent::ReviewRequested, &bg_tx);
        }

        match line_rx.try_recv() {
            Ok(line) => {
                if !handle_line(&mut app, &line, &bg_tx, &mut debounce, delay_ms)? {
                    break;
                }
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => break,
        }

        let shown = fingerprint(&app);
        if shown != last_shown {
            last_shown = shown;
            render(&app);
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    app.autosave();
    Ok(())
}

fn build_session(args: &Args, config: &Config, store: Option<&DocumentStore>) -> Result<Session> {
    if args.resume {
        if let Some(snapshot) = store.and_then(DocumentStore::load_session) {
            return Ok(Session::from_snapshot(snapshot));
        }
        eprintln!("  No autosaved session found, starting fresh");
    }

    let document = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let tone = args
        .tone
        .clone()
        .or_else(|| config.default_tone.clone())
        .unwrap_or_else(|| SessionConfig::default().tone);

    Ok(Session::from_snapshot(SessionSnapshot {
        document,
        config: SessionConfig {
            tone,
            structure: args.structure.into(),
            enforce_rhyme: args.rhyme,
        },
    }))
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(line.trim_end().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Handle one input line. Returns false when the loop should exit.
fn handle_line(
    app: &mut App,
    line: &str,
    tx: &mpsc::Sender<BackgroundMessage>,
    debounce: &mut Debouncer<Timer>,
    delay_ms: u64,
) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(true);
    }

    if !line.starts_with(':') {
        // plain text extends the document
        let mut document = app.session.document().to_string();
        if !document.is_empty() {
            document.push('\n');
        }
        document.push_str(line);
        apply_event(app, SessionEvent::DocumentEdited(document), tx);
        if delay_ms > 0 {
            debounce.schedule(
                Timer::AutoReview,
                Instant::now(),
                Duration::from_millis(delay_ms),
            );
        }
        return Ok(true);
    }

    let mut parts = line.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();

    match command {
        ":q" | ":quit" => return Ok(false),
        ":help" => print_help(),
        ":gen" => {
            debounce.cancel(&Timer::AutoReview);
            apply_event(app, SessionEvent::ReviewRequested, tx);
        }
        ":show" => show(app),
        ":a" => apply_event(app, SessionEvent::AcceptActive, tx),
        ":d" => apply_event(app, SessionEvent::DismissActive, tx),
        ":r" => apply_event(app, SessionEvent::ResuggestActive, tx),
        ":at" | ":dt" | ":rt" => {
            if let Some(original) = tone_original(app, arg) {
                let event = match command {
                    ":at" => SessionEvent::AcceptTone { original },
                    ":dt" => SessionEvent::DismissTone { original },
                    _ => SessionEvent::ResuggestTone { original },
                };
                apply_event(app, event, tx);
            }
        }
        ":x" => {
            if let Some(original) = tone_original(app, arg) {
                if rest.is_empty() {
                    app.note("usage: :x N WORD");
                } else {
                    apply_event(
                        app,
                        SessionEvent::ToggleWordExclusion {
                            original,
                            word: rest.to_string(),
                        },
                        tx,
                    );
                }
            }
        }
        ":tone" => {
            let mut config = app.session.config().clone();
            config.tone = format!("{} {}", arg, rest).trim().to_string();
            apply_event(app, SessionEvent::ConfigChanged(config), tx);
        }
        ":structure" => {
            let mut config = app.session.config().clone();
            config.structure = match arg {
                "strict" => StructureKind::Strict,
                _ => StructureKind::Loose,
            };
            apply_event(app, SessionEvent::ConfigChanged(config), tx);
        }
        ":rhyme" => {
            let mut config = app.session.config().clone();
            config.enforce_rhyme = arg == "on";
            apply_event(app, SessionEvent::ConfigChanged(config), tx);
        }
        ":save" => match (&app.store, arg.is_empty()) {
            (Some(store), false) => match store.save_document(arg, app.session.document()) {
                Ok(()) => app.note(&format!("saved as \"{}\"", arg)),
                Err(e) => app.note(&format!("save failed: {}", e)),
            },
            _ => app.note("usage: :save NAME"),
        },
        ":load" => match (&app.store, arg.is_empty()) {
            (Some(store), false) => match store.load_document(arg) {
                Some(doc) => {
                    apply_event(app, SessionEvent::DocumentEdited(doc.text), tx);
                    println!("{}", app.session.document());
                }
                None => app.note(&format!("no document named \"{}\"", arg)),
            },
            _ => app.note("usage: :load NAME"),
        },
        ":clear" => apply_event(app, SessionEvent::DocumentEdited(String::new()), tx),
        _ => app.note("unknown command, :help for the list"),
    }
    Ok(true)
}

/// Map a 1-based display index to a tone suggestion's identity key
fn tone_original(app: &App, arg: &str) -> Option<String> {
    let index: usize = match arg.parse() {
        Ok(n) if n >= 1 => n,
        _ => {
            app.note("expected a suggestion number");
            return None;
        }
    };
    match app.session.tone_suggestions().get(index - 1) {
        Some(s) => Some(s.original_text.clone()),
        None => {
            app.note("no such tone suggestion");
            None
        }
    }
}

fn fingerprint(app: &App) -> (ReviewState, u64, LoadingState, usize, usize) {
    (
        app.session.state(),
        app.session.epoch(),
        app.loading,
        app.session.grammar_suggestions().len(),
        app.session.tone_suggestions().len(),
    )
}

fn render(app: &App) {
    if let Some(label) = app.loading.label() {
        println!("  … {}", label);
        return;
    }
    match app.session.state() {
        ReviewState::ReviewingGrammar { index } => {
            if let Some(s) = app.session.active_grammar() {
                println!(
                    "  [grammar {}/{}] \"{}\" → \"{}\"",
                    index + 1,
                    app.session.grammar_suggestions().len(),
                    s.original_text,
                    s.corrected_text
                );
                println!("    {}", s.explanation);
                println!("    :a accept · :d dismiss · :r resuggest");
            }
        }
        ReviewState::ReviewingTone => {
            let list = app.session.tone_suggestions();
            if list.is_empty() {
                println!("  no tone suggestions, reading well as it is");
                return;
            }
            for (i, s) in list.iter().enumerate() {
                println!(
                    "  [tone {}] \"{}\" → \"{}\"  ({})",
                    i + 1,
                    s.original_text,
                    s.corrected_text,
                    s.explanation
                );
            }
            println!("    :at N accept · :dt N dismiss · :rt N resuggest · :x N WORD");
        }
        _ => {}
    }
}

fn show(app: &App) {
    println!("--- document ---");
    println!("{}", app.session.document());
    println!("--- state: {} ---", app.session.state().status_text());
    render(app);
}

fn print_help() {
    println!("  type text to extend the document (auto-review after a pause)");
    println!("  :gen            review now");
    println!("  :a / :d / :r    accept / dismiss / resuggest the grammar correction");
    println!("  :at N / :dt N / :rt N   accept / dismiss / resuggest tone suggestion N");
    println!("  :x N WORD       exclude one word of tone suggestion N's phrasing");
    println!("  :tone LABEL · :structure loose|strict · :rhyme on|off");
    println!("  :save NAME / :load NAME / :clear / :show / :q");
}
