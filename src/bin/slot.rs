use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use slot_rs::config::{log_file_path, SlotConfig, LOG_FILE_ENV};
use slot_rs::tui::{app::AppState, controller};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Stdout};
use std::process::ExitCode;
use std::time::Duration;

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Log records go to a file. Anything written to stderr would land on the
/// alternate screen.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"));
    let path = log_file_path(std::env::var_os(LOG_FILE_ENV));
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(err) => {
            eprintln!("slot-rs: logging disabled, cannot open {}: {err}", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn load_config() -> Result<SlotConfig, slot_rs::config::ConfigError> {
    match std::env::args_os().nth(1) {
        Some(path) => SlotConfig::load(path),
        None => Ok(SlotConfig::default()),
    }
}

fn main() -> ExitCode {
    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("slot-rs: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut app = match AppState::new(config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("slot-rs: {err}");
            return ExitCode::FAILURE;
        }
    };

    if !io::stdout().is_terminal() {
        println!(
            "slot-rs TUI requires a real terminal (TTY).\nRun in Terminal and press q to quit. Version: {}",
            slot_rs::VERSION
        );
        return ExitCode::SUCCESS;
    }

    match run(&mut app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("slot-rs: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(app: &mut AppState) -> io::Result<()> {
    let mut terminal = setup_terminal()?;
    let tick_rate = Duration::from_millis(33);
    let res = controller::run(&mut terminal, app, tick_rate);

    // Always attempt to restore terminal
    restore_terminal(terminal)?;
    res
}
