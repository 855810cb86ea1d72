mod app;

use action::Action;
use app::App;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Read;
use std::path::PathBuf;
use std::{error::Error, fs, io, time::Duration};
use turbit::{FillPolicy, ProgramLoader, Settings};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A binary Turing machine simulator with a Terminal User Interface.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  turbit-tui programs/binary-increment.rules
  cat programs/bit-inverter.rules | turbit-tui --fill off")]
struct Cli {
    /// Path to a rule table file.
    /// If not provided, the application will load the built-in programs.
    /// Can also pipe a rule table via stdin.
    rules_file: Option<PathBuf>,

    /// Settings file (JSON)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// What new tape cells contain: blank, off, on or random
    #[clap(short, long)]
    fill: Option<FillPolicy>,

    /// Ticks per second while running
    #[clap(short, long)]
    speed: Option<f64>,

    /// Where the save key writes the tape dump
    #[clap(long, default_value = "tape.bin")]
    dump: PathBuf,
}

/// Represents the state of the application loop.
#[derive(PartialEq)]
enum AppState {
    Running,
    ShouldQuit,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Errors are ignored here; there is nothing left to report them to.
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Everything that can fail is loaded before the alternate screen is entered, so
    // errors reach stderr intact.
    let app = match load_app(&cli) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut tui = Tui::new()?;
    run_app(&mut tui.terminal, app)?;

    Ok(())
}

/// Builds the app from a rule file, then piped stdin, and finally the built-in programs.
fn load_app(cli: &Cli) -> Result<App, Box<dyn Error>> {
    let mut settings = match &cli.config {
        Some(path) => ProgramLoader::load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(fill) = cli.fill {
        settings.fill = fill;
    }
    if let Some(speed) = cli.speed {
        settings.speed = speed;
    }

    let dump = cli.dump.clone();

    if let Some(path) = &cli.rules_file {
        let rules = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
        Ok(App::new_from_rules_string(rules, settings, dump)?)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        Ok(App::new_from_rules_string(buffer, settings, dump)?)
    } else {
        Ok(App::new_default(settings, dump)?)
    }
}

/// Runs the main application loop.
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = if app.is_running() {
            POLL_INTERVAL
        } else {
            IDLE_POLL_INTERVAL
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(&mut app, key) == AppState::ShouldQuit {
                    return Ok(());
                }
            }
        }

        app.tick();
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> AppState {
    if app.is_editing() {
        app.handle_input(key);
        return AppState::Running;
    }

    let action = app.keymap.get(&key).map(|action| action.clone());
    match action {
        Some(Action::Quit) => AppState::ShouldQuit,
        Some(action) => {
            app.handle(action);
            AppState::Running
        }
        None => AppState::Running,
    }
}
