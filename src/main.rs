mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use qscout::config::{FileConfigStore, GameConfig};
use qscout::export::PayloadLog;
use qscout::form::Form;
use qscout::reset;
use qscout::runtime::{CrosstermEventSource, FixedTicker, FormEvent, Runner};
use qscout::widget::Widget as FormWidget;

const TICK_RATE_MS: u64 = 10;

/// declarative scouting form tui with qr payload assembly
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Renders a data-entry form from a declarative JSON configuration and encodes the entered values into a single delimited string, ready for QR encoding."
)]
pub struct Cli {
    /// path to the form configuration file
    config: Option<PathBuf>,

    /// payload delimiter override
    #[clap(short = 'd', long)]
    delimiter: Option<String>,

    /// do not append generated payloads to the scan log
    #[clap(long)]
    no_log: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Editing,
    Payload,
    ConfirmReset,
}

pub struct App {
    pub cli: Option<Cli>,
    pub form: Form,
    pub state: AppState,
    pub focus: usize,
    pub payload: Option<String>,
    pub diagnostics: Vec<String>,
    log: Option<PayloadLog>,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let store = match &cli.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };

        let mut config = match store.try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                // Before the alternate screen, so the operator sees it.
                eprintln!("failed to load {}: {err}", store.path().display());
                GameConfig::error_fallback()
            }
        };

        if let Some(delimiter) = &cli.delimiter {
            config.delimiter = Some(delimiter.clone());
        }

        let form = Form::build(&config);
        let log = (!cli.no_log).then(PayloadLog::new);

        Self {
            cli: Some(cli),
            form,
            state: AppState::Editing,
            focus: 0,
            payload: None,
            diagnostics: vec![],
            log,
        }
    }

    pub fn focused_widget(&self) -> Option<&FormWidget> {
        self.form.widgets().nth(self.focus)
    }

    pub fn focus_next(&mut self) {
        let count = self.form.widget_count();
        if count > 0 {
            self.focus = (self.focus + 1) % count;
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.form.widget_count();
        if count > 0 {
            self.focus = (self.focus + count - 1) % count;
        }
    }

    pub fn generate_payload(&mut self) {
        let payload = self.form.assemble(Instant::now());
        if let Some(log) = &self.log {
            // Logging failures never block payload generation.
            let _ = log.append(&payload);
        }
        self.payload = Some(payload);
        self.state = AppState::Payload;
    }

    pub fn reset_form(&mut self) {
        let diags = self.form.reset();
        self.diagnostics.extend(diags);
        self.state = AppState::Editing;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(cli);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            FormEvent::Tick => {
                // Redraw only while a timer readout needs refreshing.
                if app.form.any_timer_running() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            FormEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            FormEvent::Key(key) => {
                if handle_key(app, key) {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}

/// Returns true when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::Payload => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
            ) {
                app.state = AppState::Editing;
            }
        }
        AppState::ConfirmReset => {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                app.reset_form();
            } else {
                app.state = AppState::Editing;
            }
        }
        AppState::Editing => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('c') => return true,
                    KeyCode::Char('g') => app.generate_payload(),
                    KeyCode::Char('r') => app.state = AppState::ConfirmReset,
                    _ => {}
                }
                return false;
            }

            match key.code {
                KeyCode::Esc => return true,
                KeyCode::Up | KeyCode::BackTab => app.focus_prev(),
                KeyCode::Down | KeyCode::Tab => app.focus_next(),
                _ => handle_widget_key(app, key),
            }
        }
    }
    false
}

fn handle_widget_key(app: &mut App, key: KeyEvent) {
    let focus = app.focus;
    let Some(widget) = app.form.widget_at_mut(focus) else {
        return;
    };
    let now = Instant::now();

    let changed = match key.code {
        KeyCode::Char(c) => widget.handle_char(c, now),
        KeyCode::Backspace => widget.pop_char(),
        KeyCode::Left => widget.left(),
        KeyCode::Right => widget.right(),
        KeyCode::Enter => widget.activate(now),
        _ => false,
    };

    if changed {
        reset::on_value_changed(widget);
    }
}
