use slot_rs::config::SlotConfig;
use slot_rs::coordinator::SpinCoordinator;
use slot_rs::events::{EventBus, EventKind, GameState, UiEvent};
use slot_rs::game::GameController;
use slot_rs::grid::Grid;
use slot_rs::rng::SeededRandom;
use slot_rs::symbols::{default_symbols, find_symbol, SymbolId};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const ALL_KINDS: [EventKind; 8] = [
    EventKind::SpinRequested,
    EventKind::SpinStarted,
    EventKind::ReelSpinStarted,
    EventKind::ReelSpinCompleted,
    EventKind::BetChanged,
    EventKind::WinOccurred,
    EventKind::SpinCompleted,
    EventKind::GameStateChanged,
];

/// Default stagger puts the last of five reels at +400 ms.
const ALL_REELS_STARTED: Duration = Duration::from_millis(400);

struct Rig {
    coordinator: SpinCoordinator,
    bus: EventBus,
    log: Rc<RefCell<Vec<UiEvent>>>,
}

impl Rig {
    fn new(balance: u64) -> Self {
        let mut cfg = SlotConfig::default();
        cfg.betting.initial_balance = balance;
        let controller = GameController::new(&cfg, Box::new(SeededRandom::new(5))).unwrap();
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in ALL_KINDS {
            let log = Rc::clone(&log);
            bus.subscribe(kind, move |e| log.borrow_mut().push(e.clone()));
        }
        let coordinator = SpinCoordinator::new(controller, bus.clone(), cfg.timing);
        Self { coordinator, bus, log }
    }

    /// Request a spin at `t0` and tick until every reel has started.
    fn spin_and_start_reels(&mut self, grid: Option<Grid>, t0: Instant) -> Instant {
        self.coordinator.request_spin(grid);
        self.coordinator.tick(t0);
        let started = t0 + ALL_REELS_STARTED;
        self.coordinator.tick(started);
        started
    }

    fn reel_starts(&self) -> Vec<(usize, Vec<SymbolId>)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                UiEvent::ReelSpinStarted { reel, target } => {
                    Some((*reel, target.iter().map(|s| s.id).collect()))
                }
                _ => None,
            })
            .collect()
    }

    fn report(&self, reels: &[usize]) {
        for &reel in reels {
            self.bus.publish(UiEvent::ReelSpinCompleted { reel });
        }
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.log.borrow().iter().map(UiEvent::kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.log.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    fn states(&self) -> Vec<(GameState, GameState)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                UiEvent::GameStateChanged { old_state, new_state, .. } => {
                    Some((*old_state, *new_state))
                }
                _ => None,
            })
            .collect()
    }
}

fn grid_of(rows: [[SymbolId; 5]; 5]) -> Grid {
    let table = default_symbols();
    Grid::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|&id| find_symbol(&table, id).unwrap()).collect())
            .collect(),
    )
    .unwrap()
}

fn losing_grid() -> Grid {
    use SymbolId::*;
    grid_of([
        [Cherry, Lemon, Plum, Bell, Bar],
        [Lemon, Plum, Bell, Bar, Cherry],
        [Plum, Bell, Bar, Cherry, Lemon],
        [Bell, Bar, Cherry, Lemon, Plum],
        [Bar, Cherry, Lemon, Plum, Bell],
    ])
}

fn cherry_row_grid() -> Grid {
    use SymbolId::*;
    grid_of([
        [Cherry, Wild, Cherry, Wild, Cherry],
        [Lemon, Plum, Bell, Bar, Cherry],
        [Plum, Bell, Bar, Cherry, Lemon],
        [Bell, Bar, Cherry, Lemon, Plum],
        [Bar, Cherry, Lemon, Plum, Bell],
    ])
}

#[test]
fn construction_announces_idle() {
    let rig = Rig::new(100);
    assert_eq!(rig.states(), vec![(GameState::Idle, GameState::Idle)]);
    assert_eq!(rig.coordinator.state(), GameState::Idle);
}

#[test]
fn losing_spin_settles_on_out_of_order_reports() {
    let mut rig = Rig::new(100);
    let t0 = rig.spin_and_start_reels(Some(losing_grid()), Instant::now());
    assert_eq!(rig.coordinator.state(), GameState::Spinning);
    assert_eq!(rig.coordinator.controller().balance(), 90);

    rig.report(&[4, 2, 0, 3]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::Spinning);
    assert_eq!(rig.coordinator.completed_reels(), 4);

    rig.report(&[1]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert_eq!(rig.coordinator.controller().balance(), 90);
    assert_eq!(rig.coordinator.controller().open_spins(), 0);
    assert!(!rig.coordinator.has_pending_spin());
    assert_eq!(rig.count(EventKind::SpinCompleted), 1);
    assert_eq!(rig.count(EventKind::WinOccurred), 0);
    assert_eq!(
        rig.states(),
        vec![
            (GameState::Idle, GameState::Idle),
            (GameState::Idle, GameState::Spinning),
            (GameState::Spinning, GameState::Idle),
        ]
    );
}

#[test]
fn spin_started_precedes_reel_targets() {
    let mut rig = Rig::new(100);
    let t0 = Instant::now();
    rig.coordinator.request_spin(None);
    rig.coordinator.tick(t0);
    let kinds = rig.kinds();
    let started = kinds.iter().position(|k| *k == EventKind::SpinStarted).unwrap();
    let first_reel = kinds.iter().position(|k| *k == EventKind::ReelSpinStarted).unwrap();
    assert!(started < first_reel);
    assert!(rig.log.borrow().iter().any(|e| matches!(
        e,
        UiEvent::SpinStarted { bet: 10, balance_after_bet: 90 }
    )));
}

#[test]
fn reel_targets_are_staggered_columns() {
    let mut rig = Rig::new(100);
    let grid = losing_grid();
    let t0 = Instant::now();
    rig.coordinator.request_spin(Some(grid.clone()));
    rig.coordinator.tick(t0);
    assert_eq!(rig.count(EventKind::ReelSpinStarted), 1);

    rig.coordinator.tick(t0 + Duration::from_millis(250));
    assert_eq!(rig.count(EventKind::ReelSpinStarted), 3);

    rig.coordinator.tick(t0 + ALL_REELS_STARTED);
    let targets = rig.reel_starts();
    assert_eq!(targets.len(), 5);
    for (i, (reel, ids)) in targets.iter().enumerate() {
        assert_eq!(*reel, i);
        let expected: Vec<SymbolId> = grid.column(i).iter().map(|s| s.id).collect();
        assert_eq!(*ids, expected);
    }
}

#[test]
fn winning_spin_shows_win_then_returns_to_idle() {
    let mut rig = Rig::new(100);
    let t0 = rig.spin_and_start_reels(Some(cherry_row_grid()), Instant::now());
    let done = t0 + Duration::from_millis(2100);
    rig.report(&[0, 1, 2, 3, 4]);
    rig.coordinator.tick(done);

    assert_eq!(rig.coordinator.state(), GameState::ShowingWin);
    assert_eq!(rig.coordinator.controller().balance(), 120);
    assert!(!rig.coordinator.can_spin());
    assert!(!rig.coordinator.can_change_bet());

    let log = rig.log.borrow().clone();
    let completed = log
        .iter()
        .find_map(|e| match e {
            UiEvent::SpinCompleted { total_winnings, final_balance, result } => {
                Some((*total_winnings, *final_balance, result.line_wins.len()))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(completed, (30, 120, 1));
    let win = log
        .iter()
        .find_map(|e| match e {
            UiEvent::WinOccurred { winning_rows, total_winnings, .. } => {
                Some((winning_rows.iter().copied().collect::<Vec<_>>(), *total_winnings))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(win, (vec![0], 30));

    rig.coordinator.tick(done + Duration::from_millis(99));
    assert_eq!(rig.coordinator.state(), GameState::ShowingWin);
    rig.coordinator.tick(done + Duration::from_millis(100));
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert!(rig.coordinator.can_spin());
}

#[test]
fn duplicate_and_unknown_reports_do_not_finish_early() {
    let mut rig = Rig::new(100);
    let t0 = Instant::now();
    rig.coordinator.request_spin(Some(losing_grid()));
    rig.coordinator.tick(t0);
    rig.report(&[0, 0, 0, 0, 0, 7, 99]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::Spinning);
    assert_eq!(rig.coordinator.completed_reels(), 1);
    assert!(rig.coordinator.has_pending_spin());

    rig.coordinator.tick(t0 + ALL_REELS_STARTED);
    rig.report(&[3, 1, 4, 2, 2]);
    rig.coordinator.tick(t0 + ALL_REELS_STARTED);
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert_eq!(rig.count(EventKind::SpinCompleted), 1);
}

#[test]
fn requests_outside_idle_are_ignored() {
    let mut rig = Rig::new(100);
    let t0 = rig.spin_and_start_reels(Some(cherry_row_grid()), Instant::now());
    rig.coordinator.request_spin(None);
    rig.coordinator.tick(t0);
    assert_eq!(rig.count(EventKind::SpinStarted), 1);
    assert_eq!(rig.coordinator.controller().balance(), 90);
    assert_eq!(rig.coordinator.controller().open_spins(), 1);

    rig.report(&[0, 1, 2, 3, 4]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::ShowingWin);
    rig.coordinator.request_spin(None);
    rig.coordinator.tick(t0);
    assert_eq!(rig.count(EventKind::SpinStarted), 1);

    // Reports after settlement change nothing.
    rig.report(&[0, 1, 2, 3, 4]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.count(EventKind::SpinCompleted), 1);
    assert_eq!(rig.coordinator.controller().balance(), 120);
}

#[test]
fn empty_balance_enters_insufficient_balance() {
    let mut rig = Rig::new(10);
    let t0 = rig.spin_and_start_reels(Some(losing_grid()), Instant::now());
    rig.report(&[0, 1, 2, 3, 4]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert_eq!(rig.coordinator.controller().balance(), 0);
    assert!(!rig.coordinator.can_spin());

    rig.coordinator.request_spin(Some(cherry_row_grid()));
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::InsufficientBalance);
    assert_eq!(rig.count(EventKind::SpinStarted), 1);
    let last = rig.log.borrow().last().cloned().unwrap();
    assert!(matches!(
        last,
        UiEvent::GameStateChanged {
            new_state: GameState::InsufficientBalance,
            can_spin: false,
            can_change_bet: false,
            ..
        }
    ));

    rig.coordinator.request_spin(None);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::InsufficientBalance);
    assert_eq!(rig.coordinator.adjust_bet(10), None);
}

#[test]
fn wrong_shape_forced_grid_is_rejected_without_charging() {
    let mut rig = Rig::new(100);
    let cherry = find_symbol(&default_symbols(), SymbolId::Cherry).unwrap();
    rig.coordinator.request_spin(Some(Grid::filled(3, 5, cherry)));
    rig.coordinator.tick(Instant::now());
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert_eq!(rig.coordinator.controller().balance(), 100);
    assert_eq!(rig.count(EventKind::SpinStarted), 0);
}

#[test]
fn bet_changes_are_broadcast_and_clamped() {
    let mut rig = Rig::new(100);
    assert_eq!(rig.coordinator.adjust_bet(10), Some(20));
    assert_eq!(rig.coordinator.adjust_bet(1000), Some(100));
    assert_eq!(rig.coordinator.adjust_bet(0), Some(100));
    assert_eq!(rig.coordinator.adjust_bet(-1000), Some(10));
    let changes: Vec<(u64, u64)> = rig
        .log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            UiEvent::BetChanged { old_bet, new_bet, balance: 100 } => Some((*old_bet, *new_bet)),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(10, 20), (20, 100), (100, 10)]);
}

#[test]
fn dropping_coordinator_releases_subscriptions() {
    let bus = EventBus::new();
    let cfg = SlotConfig::default();
    let controller = GameController::new(&cfg, Box::new(SeededRandom::new(1))).unwrap();
    {
        let mut coordinator = SpinCoordinator::new(controller, bus.clone(), cfg.timing);
        coordinator.request_spin(None);
        coordinator.tick(Instant::now());
        assert_eq!(bus.listener_count(EventKind::ReelSpinCompleted), 1);
        assert!(coordinator.scheduled_timers() > 0);
    }
    assert_eq!(bus.listener_count(EventKind::SpinRequested), 0);
    assert_eq!(bus.listener_count(EventKind::ReelSpinCompleted), 0);
    bus.publish(UiEvent::ReelSpinCompleted { reel: 0 });
}

#[test]
fn reports_before_reel_start_are_ignored() {
    let mut rig = Rig::new(100);
    let t0 = Instant::now();
    rig.coordinator.request_spin(Some(losing_grid()));
    rig.coordinator.tick(t0);
    assert_eq!(rig.count(EventKind::ReelSpinStarted), 1);

    rig.report(&[0, 1, 2, 3, 4]);
    rig.coordinator.tick(t0);
    assert_eq!(rig.coordinator.state(), GameState::Spinning);
    assert_eq!(rig.coordinator.completed_reels(), 1);
    assert_eq!(rig.count(EventKind::SpinCompleted), 0);
}

#[test]
fn next_spin_gets_only_its_own_reel_targets() {
    let mut rig = Rig::new(100);
    let t0 = Instant::now();
    let first = losing_grid();
    rig.coordinator.request_spin(Some(first.clone()));
    rig.coordinator.tick(t0);
    let t1 = t0 + Duration::from_millis(150);
    rig.coordinator.tick(t1);
    rig.report(&[0, 1]);
    rig.coordinator.tick(t1);
    assert_eq!(rig.coordinator.scheduled_timers(), 3);

    // Finishing the first spin leaves no reel starts behind for the next one.
    rig.coordinator.tick(t0 + ALL_REELS_STARTED);
    rig.report(&[2, 3, 4]);
    rig.coordinator.tick(t0 + ALL_REELS_STARTED);
    assert_eq!(rig.coordinator.state(), GameState::Idle);
    assert_eq!(rig.coordinator.scheduled_timers(), 0);

    let second = cherry_row_grid();
    let before = rig.reel_starts().len();
    let s0 = t0 + Duration::from_millis(1000);
    rig.spin_and_start_reels(Some(second.clone()), s0);
    let starts = rig.reel_starts().split_off(before);
    let reels: Vec<usize> = starts.iter().map(|(reel, _)| *reel).collect();
    assert_eq!(reels, vec![0, 1, 2, 3, 4]);
    for (reel, ids) in starts {
        let expected: Vec<SymbolId> = second.column(reel).iter().map(|s| s.id).collect();
        assert_eq!(ids, expected);
    }
}
