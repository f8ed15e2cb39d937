use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};
use tracing::info;

use recite::{
    app::App,
    catalog::{Catalog, Category},
    config::{Config, ConfigStore, FileConfigStore, Theme},
    notify::{Notifier, SilentNotifier, TerminalBell},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    telemetry, ui, TICK_RATE_MS,
};

/// type classic passages and watch your speed
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing practice over classic Chinese poems and English opening lines. Every passage reports accuracy and characters per minute, and the session keeps a running average."
)]
pub struct Cli {
    /// passage category to start with
    #[clap(short = 'c', long, value_enum)]
    category: Option<Category>,

    /// color theme
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,

    /// hide the attribution line under the passage counter
    #[clap(long)]
    hide_source: bool,

    /// do not ring the terminal bell when a passage is completed
    #[clap(long)]
    mute: bool,

    /// write a JSON trace log (also enabled by setting RECITE_LOG)
    #[clap(long)]
    log: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line flags over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(category) = self.category {
            config.category = category;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if self.hide_source {
            config.show_source = false;
        }
        if self.mute {
            config.mute = true;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = telemetry::init_tracing(telemetry::logging_requested(cli.log)) {
        info!(path = %path.display(), "tracing enabled");
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let catalog = Catalog::load()?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if config.mute {
        run(App::new(catalog, &config, SilentNotifier))
    } else {
        run(App::new(catalog, &config, TerminalBell))
    }
}

fn run<N: Notifier>(mut app: App<N>) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, N: Notifier, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<N>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        let event = runner.step();
        if app.handle_event(event, Instant::now()) && !app.should_quit {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}
