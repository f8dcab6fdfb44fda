mod ui;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mentortype::{
    app_dirs::AppDirs,
    coach::Language,
    config::{Config, ConfigStore, FileConfigStore},
    feedback::{FeedbackDispatcher, FeedbackRequester, OfflineFeedback},
    gemini::{GeminiClient, GeminiFeedback},
    history::HistoryStore,
    logging,
    runtime::{CoachEvent, CoachEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    samples::SampleProvider,
    session::TypingSession,
    store::{KeyValueStore, MemoryStore, SqliteStore},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    io::{self, stdin, Write},
    sync::Arc,
    time::Duration,
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;

/// terminal typing coach with positional accuracy scoring and AI feedback
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a sentence, get words-per-minute and accuracy, keep your last five results, and receive a short coaching tip in English or Tamil."
)]
pub struct Cli {
    /// language the coach answers in (saved for next time)
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// custom sentence to type instead of the bundled ones
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// seed for reproducible sentence selection
    #[clap(long)]
    seed: Option<u64>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// show the most recent results
    History {
        /// forget all stored results
        #[clap(long)]
        clear: bool,
    },
}

impl Cli {
    fn samples(&self) -> Result<SampleProvider> {
        let provider = match &self.prompt {
            Some(prompt) => SampleProvider::from_sentences(vec![prompt.clone()]),
            None => SampleProvider::bundled(),
        }
        .context("cannot load reference sentences")?;

        Ok(match self.seed {
            Some(seed) => provider.with_seed(seed),
            None => provider,
        })
    }

    /// Applies CLI overrides, persisting a changed language.
    fn resolve_config(&self, store: &dyn ConfigStore) -> Config {
        let mut config = store.load();
        if let Some(language) = self.language {
            if language != config.language {
                config.language = language;
                if let Err(e) = store.save(&config) {
                    warn!(error = %e, "could not save config");
                }
            }
        }
        config
    }
}

#[derive(Debug)]
pub struct App {
    pub session: TypingSession,
    pub language: Language,
}

impl App {
    pub fn new(session: TypingSession, language: Language) -> Self {
        Self { session, language }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Left => app.session.retry(),
        KeyCode::Right => app.session.restart(),
        KeyCode::Backspace => {
            app.session.backspace();
        }
        // shortcuts are not text
        KeyCode::Char(_)
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {}
        KeyCode::Char(c) if app.session.is_finished() => match c {
            'r' => app.session.retry(),
            'n' => app.session.restart(),
            _ => {}
        },
        KeyCode::Char(c) => {
            app.session.write(c);
        }
        _ => {}
    }
    Action::Continue
}

fn handle_event(app: &mut App, event: CoachEvent) -> Action {
    match event {
        CoachEvent::Key(key) => handle_key(app, key),
        CoachEvent::Feedback(reply) => {
            app.session.apply_feedback(reply);
            Action::Continue
        }
        CoachEvent::Tick | CoachEvent::Resize => Action::Continue,
    }
}

fn open_store() -> Box<dyn KeyValueStore> {
    match AppDirs::store_path().map(SqliteStore::open) {
        Some(Ok(store)) => Box::new(store),
        Some(Err(e)) => {
            warn!(error = %e, "history store unavailable, keeping history in memory");
            Box::new(MemoryStore::new())
        }
        None => {
            warn!("no state directory, keeping history in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn feedback_requester(config: &Config) -> Arc<dyn FeedbackRequester> {
    let Some(api_key) = GeminiClient::api_key_from_env() else {
        info!("no API key set, coaching feedback disabled");
        return Arc::new(OfflineFeedback);
    };

    match GeminiClient::new(
        api_key,
        &config.api_base,
        &config.model,
        config.feedback_timeout(),
    ) {
        Ok(client) => Arc::new(GeminiFeedback::new(client, config.language)),
        Err(e) => {
            warn!(error = %e, "cannot build HTTP client, coaching feedback disabled");
            Arc::new(OfflineFeedback)
        }
    }
}

fn print_history(store: &HistoryStore, clear: bool, out: &mut impl Write) -> Result<()> {
    if clear {
        store.clear().context("cannot clear history")?;
        writeln!(out, "History cleared.")?;
        return Ok(());
    }

    let log = store.load();
    if log.is_empty() {
        writeln!(out, "No typing history yet.")?;
        return Ok(());
    }

    for result in &log {
        writeln!(
            out,
            "{:<12} {:>4} WPM / {:>3}%",
            result.date, result.wpm, result.accuracy
        )?;
    }
    if let (Some(wpm), Some(acc)) = (log.average_wpm(), log.average_accuracy()) {
        writeln!(out, "average {wpm:.0} WPM / {acc:.0}%")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        logging::init_file_logging(&path);
    }

    let config = cli.resolve_config(&FileConfigStore::new());
    let history_store = HistoryStore::new(open_store());

    if let Some(Command::History { clear }) = &cli.command {
        return print_history(&history_store, *clear, &mut io::stdout());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let samples = cli.samples()?;
    let events = CrosstermEventSource::new();
    let dispatcher = FeedbackDispatcher::new(feedback_requester(&config), events.sender());
    let session = TypingSession::new(samples, history_store, Box::new(dispatcher));
    let mut app = App::new(session, config.language);
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, E: CoachEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        if handle_event(app, runner.step()) == Action::Quit {
            return Ok(());
        }
    }
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentortype::feedback::{FeedbackReply, FALLBACK_FEEDBACK};
    use mentortype::runtime::TestEventSource;
    use mentortype::session::{FeedbackState, Phase};
    use mentortype::timer::ManualClock;
    use std::sync::mpsc::{self, Receiver};

    /// App on a single fixed sentence, offline feedback delivered into the returned channel.
    pub(crate) fn test_app(prompt: &str) -> (App, Receiver<CoachEvent>) {
        let (tx, rx) = mpsc::channel();
        let dispatcher = FeedbackDispatcher::new(Arc::new(OfflineFeedback), tx);
        let session = TypingSession::new(
            SampleProvider::from_sentences(vec![prompt.to_string()]).unwrap(),
            HistoryStore::new(Box::new(MemoryStore::new())),
            Box::new(dispatcher),
        )
        .with_clock(Box::new(ManualClock::default()));
        (App::new(session, Language::English), rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["mentortype"]);

        assert_eq!(cli.language, None);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_language() {
        let cli = Cli::parse_from(["mentortype", "-l", "tamil"]);
        assert_eq!(cli.language, Some(Language::Tamil));

        let cli = Cli::parse_from(["mentortype", "--language", "english"]);
        assert_eq!(cli.language, Some(Language::English));
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["mentortype", "-p", "hello world"]);
        assert_eq!(cli.prompt, Some("hello world".to_string()));
        assert_eq!(cli.samples().unwrap().sentences(), ["hello world"]);
    }

    #[test]
    fn test_cli_blank_prompt_rejected() {
        let cli = Cli::parse_from(["mentortype", "--prompt", "  "]);
        assert!(cli.samples().is_err());
    }

    #[test]
    fn test_cli_history_subcommand() {
        let cli = Cli::parse_from(["mentortype", "history"]);
        assert_eq!(cli.command, Some(Command::History { clear: false }));

        let cli = Cli::parse_from(["mentortype", "history", "--clear"]);
        assert_eq!(cli.command, Some(Command::History { clear: true }));
    }

    #[test]
    fn test_resolve_config_saves_language_override() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));

        let cli = Cli::parse_from(["mentortype", "-l", "tamil"]);
        assert_eq!(cli.resolve_config(&store).language, Language::Tamil);

        let cli = Cli::parse_from(["mentortype"]);
        assert_eq!(cli.resolve_config(&store).language, Language::Tamil);
    }

    #[test]
    fn test_typing_flow_through_keys() {
        let (mut app, rx) = test_app("hi");

        assert_eq!(handle_key(&mut app, key(KeyCode::Char('h'))), Action::Continue);
        assert_eq!(app.session.phase(), Phase::InProgress);
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.session.phase(), Phase::Finished);
        assert_eq!(app.session.feedback(), &FeedbackState::Loading);

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle_event(&mut app, event);
        assert_eq!(
            app.session.feedback(),
            &FeedbackState::Ready(FALLBACK_FEEDBACK.to_string())
        );
        assert_eq!(app.session.result().unwrap().accuracy, 100);
    }

    #[test]
    fn test_results_keys() {
        let (mut app, _rx) = test_app("hi");
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('i')));

        // other letters do nothing once finished
        handle_key(&mut app, key(KeyCode::Char('x')));
        assert!(app.session.is_finished());

        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.history().len(), 1);
    }

    #[test]
    fn test_backspace_key() {
        let (mut app, _rx) = test_app("hello");
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('x')));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.session.input(), "h");
    }

    #[test]
    fn test_arrow_keys_reset_attempt() {
        let (mut app, _rx) = test_app("hello");
        handle_key(&mut app, key(KeyCode::Char('h')));
        let generation = app.session.generation();

        handle_key(&mut app, key(KeyCode::Left));
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.reference(), "hello");

        handle_key(&mut app, key(KeyCode::Right));
        assert_eq!(app.session.generation(), generation + 2);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = test_app("hello");
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            handle_key(
                &mut app,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
            ),
            Action::Quit
        );
    }

    #[test]
    fn test_modified_chars_are_not_typed() {
        let (mut app, _rx) = test_app("hello");
        handle_key(&mut app, key(KeyCode::Char('h')));

        for modifiers in [
            KeyModifiers::CONTROL,
            KeyModifiers::ALT,
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ] {
            assert_eq!(
                handle_key(&mut app, KeyEvent::new(KeyCode::Char('e'), modifiers)),
                Action::Continue
            );
        }
        assert_eq!(app.session.input(), "h");

        // shifted letters are still text
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT),
        );
        assert_eq!(app.session.input(), "hE");
    }

    #[test]
    fn test_modified_chars_do_not_reset_results() {
        let (mut app, _rx) = test_app("hi");
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('i')));

        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('n'), KeyModifiers::ALT),
        );
        assert!(app.session.is_finished());
    }

    #[test]
    fn test_stale_feedback_event_ignored() {
        let (mut app, _rx) = test_app("hi");
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('i')));
        let old = app.session.generation();
        handle_key(&mut app, key(KeyCode::Char('n')));

        handle_event(
            &mut app,
            CoachEvent::Feedback(FeedbackReply {
                generation: old,
                message: "late".into(),
            }),
        );
        assert_eq!(app.session.feedback(), &FeedbackState::Idle);
    }

    #[test]
    fn test_print_history() {
        let store = HistoryStore::new(Box::new(MemoryStore::new()));
        let mut out = Vec::new();
        print_history(&store, false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No typing history yet.\n");

        let (mut app, _rx) = test_app("hi");
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('i')));
        store.persist(app.session.history());

        let mut out = Vec::new();
        print_history(&store, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("WPM / 100%"));
        assert!(text.contains("average"));

        let mut out = Vec::new();
        print_history(&store, true, &mut out).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_start_tui_quits_on_escape() {
        use ratatui::backend::TestBackend;

        let (mut app, _feedback_rx) = test_app("hi");
        let (tx, rx) = mpsc::channel();
        tx.send(CoachEvent::Key(key(KeyCode::Char('h')))).unwrap();
        tx.send(CoachEvent::Key(key(KeyCode::Esc))).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.session.input(), "h");
    }
}
