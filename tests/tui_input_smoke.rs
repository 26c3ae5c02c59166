use slot_rs::config::SlotConfig;
use slot_rs::events::GameState;
use slot_rs::tui::app::{AppState, InputAction, Scene};
use std::time::{Duration, Instant};

fn setup_machine_app() -> AppState {
    let mut app = AppState::seeded(SlotConfig::default(), 77).unwrap();
    assert!(app.handle_input(InputAction::MenuApply));
    app
}

/// Tick in 50ms steps until the machine is idle again.
fn run_until_idle(app: &mut AppState, start: Instant) -> Instant {
    let mut now = start;
    for _ in 0..200 {
        app.on_tick(now);
        if app.state() == GameState::Idle && !app.reels_spinning() {
            break;
        }
        now += Duration::from_millis(50);
    }
    now
}

#[test]
fn menu_navigation_and_apply() {
    let mut app = AppState::seeded(SlotConfig::default(), 1).unwrap();
    assert!(matches!(app.scene, Scene::Menu));
    let start = app.menu_index;
    let _ = app.handle_input(InputAction::MenuNext);
    assert_ne!(app.menu_index, start);
    let _ = app.handle_input(InputAction::MenuPrev);
    assert_eq!(app.menu_index, start);
    let _ = app.handle_input(InputAction::MenuApply);
    assert!(matches!(app.scene, Scene::Machine));
}

#[test]
fn menu_edits_reset_the_ledger() {
    let mut app = AppState::seeded(SlotConfig::default(), 1).unwrap();
    let _ = app.handle_input(InputAction::MenuInc); // starting balance
    let _ = app.handle_input(InputAction::MenuNext);
    let _ = app.handle_input(InputAction::MenuInc); // min bet
    assert!(app.handle_input(InputAction::MenuApply));
    assert_eq!(app.balance(), 150);
    assert_eq!(app.bet(), 15);
    assert_eq!(app.config.betting.min_bet, 15);
}

#[test]
fn help_and_history_toggle() {
    let mut app = setup_machine_app();
    let _ = app.handle_input(InputAction::ToggleHelp);
    assert!(app.help_open());
    let _ = app.handle_input(InputAction::ToggleHistory);
    assert!(!app.help_open());
    assert!(app.history_open());
    let _ = app.handle_input(InputAction::ToggleHistory);
    assert!(!app.history_open());
}

#[test]
fn bet_keys_step_by_increment() {
    let mut app = setup_machine_app();
    assert!(app.handle_input(InputAction::BetUp));
    assert_eq!(app.bet(), 20);
    assert!(app.handle_input(InputAction::BetDown));
    assert!(!app.handle_input(InputAction::BetDown));
    assert_eq!(app.bet(), 10);
}

#[test]
fn forced_win_spin_animates_and_pays() {
    let mut app = setup_machine_app();
    let t0 = Instant::now();
    assert!(app.handle_input(InputAction::ForceWin));
    app.on_tick(t0);
    assert_eq!(app.state(), GameState::Spinning);
    assert!(app.reels_spinning());
    assert!(!app.handle_input(InputAction::Spin));
    assert!(!app.handle_input(InputAction::BetUp));

    run_until_idle(&mut app, t0);
    assert_eq!(app.state(), GameState::Idle);
    assert_eq!(app.history_len(), 1);
    assert!(app.last_win() > 0);
    assert_eq!(app.balance(), 90 + app.last_win());
    assert!(!app.last_lines().is_empty());
}

#[test]
fn reels_land_on_the_settled_grid() {
    let mut app = setup_machine_app();
    let t0 = Instant::now();
    assert!(app.handle_input(InputAction::Spin));
    run_until_idle(&mut app, t0);
    let rows = app.visible_rows();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.len() == 5));
    let entry = app.history_recent(1, 0)[0];
    assert_eq!(entry.number, 1);
    assert_eq!(entry.balance, app.balance());
}

#[test]
fn menu_is_locked_during_a_spin() {
    let mut app = setup_machine_app();
    assert!(app.handle_input(InputAction::Spin));
    app.on_tick(Instant::now());
    assert!(!app.handle_input(InputAction::ToggleMenu));
    assert!(matches!(app.scene, Scene::Machine));
}
