use crate::tui::app::{AppState, InputAction, Scene};
use crate::tui::ui;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut AppState,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release && handle_key(app, key.code) {
                    break;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }
    }
    Ok(())
}

/// Map a key to an action. Returns true when the app should quit.
pub fn handle_key(app: &mut AppState, code: KeyCode) -> bool {
    if matches!(code, KeyCode::Char('q' | 'Q')) {
        return true;
    }
    if let Some(action) = action_for(app, code) {
        app.handle_input(action);
    }
    false
}

fn action_for(app: &AppState, code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::Char('?') => return Some(InputAction::ToggleHelp),
        KeyCode::Char('h' | 'H') => return Some(InputAction::ToggleHistory),
        _ => {}
    }
    if app.help_open() {
        return (code == KeyCode::Esc).then_some(InputAction::ToggleHelp);
    }
    if app.history_open() {
        return match code {
            KeyCode::Up => Some(InputAction::HistoryUp),
            KeyCode::Down => Some(InputAction::HistoryDown),
            KeyCode::Esc => Some(InputAction::ToggleHistory),
            _ => None,
        };
    }
    let action = match (app.scene, code) {
        (_, KeyCode::Char('m' | 'M')) => InputAction::ToggleMenu,
        (Scene::Menu, KeyCode::Up) => InputAction::MenuPrev,
        (Scene::Menu, KeyCode::Down) => InputAction::MenuNext,
        (Scene::Menu, KeyCode::Char('+' | '=')) => InputAction::MenuInc,
        (Scene::Menu, KeyCode::Char('-' | '_')) => InputAction::MenuDec,
        (Scene::Menu, KeyCode::Enter) => InputAction::MenuApply,
        (Scene::Menu, KeyCode::Esc) => InputAction::MenuCancel,
        (Scene::Machine, KeyCode::Char(' ') | KeyCode::Enter) => InputAction::Spin,
        (Scene::Machine, KeyCode::Char('w' | 'W')) => InputAction::ForceWin,
        (Scene::Machine, KeyCode::Char('+' | '=') | KeyCode::Up) => InputAction::BetUp,
        (Scene::Machine, KeyCode::Char('-' | '_') | KeyCode::Down) => InputAction::BetDown,
        _ => return None,
    };
    Some(action)
}
