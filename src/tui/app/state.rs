use crate::config::{ConfigError, SlotConfig};
use crate::coordinator::SpinCoordinator;
use crate::events::{EventBus, EventKind, GameState, Mailbox, UiEvent};
use crate::game::GameController;
use crate::payline::LineWin;
use crate::rng::{RandomSource, SeededRandom, SystemRandom};
use crate::symbols::SymbolId;
use crate::tui::reels::{ReelStrip, ReelView, RenderTiming, WinHighlight};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Scene {
    Menu,
    Machine,
}

/// High-level input actions for the TUI controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputAction {
    MenuNext,
    MenuPrev,
    MenuInc,
    MenuDec,
    MenuApply,
    MenuCancel,
    ToggleMenu,
    ToggleHelp,
    ToggleHistory,
    HistoryUp,
    HistoryDown,
    Spin,
    ForceWin,
    BetUp,
    BetDown,
}

/// One settled spin as shown in the history overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub number: u64,
    pub bet: u64,
    pub winnings: u64,
    pub balance: u64,
    pub lines: Vec<String>,
}

/// Renderer-side state: the coordinator it drives, the reels it animates and
/// whatever the overlays need.
#[non_exhaustive]
pub struct AppState {
    pub scene: Scene,
    pub started: Instant,
    pub config: SlotConfig,
    pub render_timing: RenderTiming,
    // Menu config being edited
    pub menu_index: usize,
    pub cfg_initial_balance: u64,
    pub cfg_min_bet: u64,
    pub cfg_bet_increment: u64,
    pub cfg_reel_stagger_ms: u64,
    bus: EventBus,
    coordinator: SpinCoordinator,
    feed: Mailbox,
    reels: Vec<ReelView>,
    ui_rng: Box<dyn RandomSource>,
    seed: Option<u64>,
    generation: u64,
    highlight: Option<WinHighlight>,
    lit_rows: BTreeSet<usize>,
    charged_bet: u64,
    last_win: u64,
    last_lines: Vec<LineWin>,
    history: VecDeque<HistoryEntry>,
    spins_played: u64,
    status: Option<String>,
    help_open: bool,
    history_open: bool,
    history_offset: usize,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("scene", &self.scene)
            .field("state", &self.coordinator.state())
            .field("balance", &self.balance())
            .field("bet", &self.bet())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

const FEED_KINDS: [EventKind; 6] = [
    EventKind::SpinStarted,
    EventKind::ReelSpinStarted,
    EventKind::WinOccurred,
    EventKind::SpinCompleted,
    EventKind::GameStateChanged,
    EventKind::BetChanged,
];

struct Machine {
    bus: EventBus,
    coordinator: SpinCoordinator,
    feed: Mailbox,
    reels: Vec<ReelView>,
}

impl AppState {
    pub const HISTORY_PAGE_SIZE: usize = 20;
    const HISTORY_LIMIT: usize = 500;

    /// Machine backed by the operating system's random source.
    pub fn new(config: SlotConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Reproducible machine for tests and demos.
    pub fn seeded(config: SlotConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, Some(seed))
    }

    fn build(config: SlotConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let mut ui_rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(SeededRandom::new(seed.rotate_left(17))),
            None => Box::new(SystemRandom::new()),
        };
        let machine = Self::assemble(&config, seed, 0, ui_rng.as_mut())?;
        let betting = config.betting;
        let stagger = config.timing.reel_stagger_ms;
        Ok(Self {
            scene: Scene::Menu,
            started: Instant::now(),
            config,
            render_timing: RenderTiming::default(),
            menu_index: 0,
            cfg_initial_balance: betting.initial_balance,
            cfg_min_bet: betting.min_bet,
            cfg_bet_increment: betting.bet_increment,
            cfg_reel_stagger_ms: stagger,
            bus: machine.bus,
            coordinator: machine.coordinator,
            feed: machine.feed,
            reels: machine.reels,
            ui_rng,
            seed,
            generation: 0,
            highlight: None,
            lit_rows: BTreeSet::new(),
            charged_bet: 0,
            last_win: 0,
            last_lines: Vec::new(),
            history: VecDeque::new(),
            spins_played: 0,
            status: None,
            help_open: false,
            history_open: false,
            history_offset: 0,
        })
    }

    fn assemble(
        config: &SlotConfig,
        seed: Option<u64>,
        generation: u64,
        ui_rng: &mut dyn RandomSource,
    ) -> Result<Machine, ConfigError> {
        let core_rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(SeededRandom::new(seed.wrapping_add(generation))),
            None => Box::new(SystemRandom::new()),
        };
        let controller = GameController::new(config, core_rng)?;
        let bus = EventBus::new();
        // Subscribe before the coordinator announces its initial state.
        let feed = bus.mailbox(&FEED_KINDS);
        let coordinator = SpinCoordinator::new(controller, bus.clone(), config.timing);

        let mut reels = Vec::with_capacity(config.columns);
        for _ in 0..config.columns {
            let strip = ReelStrip::weighted(&config.symbols, config.rows, ui_rng)
                .ok_or(ConfigError::EmptySymbolTable)?;
            let top = ui_rng.int(0, strip.len() as i64 - 1) as usize;
            reels.push(ReelView::new(strip, config.rows, top));
        }
        Ok(Machine { bus, coordinator, feed, reels })
    }

    /// Swap in a freshly built machine for `config`. Ledger and history restart.
    pub(crate) fn rebuild(&mut self, config: SlotConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let generation = self.generation + 1;
        let machine = Self::assemble(&config, self.seed, generation, self.ui_rng.as_mut())?;
        self.coordinator.shutdown();
        self.generation = generation;
        self.bus = machine.bus;
        self.coordinator = machine.coordinator;
        self.feed = machine.feed;
        self.reels = machine.reels;
        self.config = config;
        self.highlight = None;
        self.lit_rows.clear();
        self.charged_bet = 0;
        self.last_win = 0;
        self.last_lines.clear();
        self.history.clear();
        self.spins_played = 0;
        self.history_offset = 0;
        self.status = None;
        log::info!(
            "Machine reset: balance {}, min bet {}, increment {}",
            self.config.betting.initial_balance,
            self.config.betting.min_bet,
            self.config.betting.bet_increment
        );
        Ok(())
    }

    pub fn coordinator(&self) -> &SpinCoordinator {
        &self.coordinator
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> GameState {
        self.coordinator.state()
    }

    pub fn balance(&self) -> u64 {
        self.coordinator.controller().balance()
    }

    pub fn bet(&self) -> u64 {
        self.coordinator.controller().bet()
    }

    pub fn last_win(&self) -> u64 {
        self.last_win
    }

    pub fn last_lines(&self) -> &[LineWin] {
        &self.last_lines
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn reels_spinning(&self) -> bool {
        self.reels.iter().any(ReelView::is_spinning)
    }

    /// Visible symbols, row-major.
    pub fn visible_rows(&self) -> Vec<Vec<SymbolId>> {
        let columns: Vec<Vec<SymbolId>> = self.reels.iter().map(ReelView::visible).collect();
        (0..self.config.rows)
            .map(|r| columns.iter().filter_map(|col| col.get(r).copied()).collect())
            .collect()
    }

    /// Rows highlighted as of the last tick.
    pub fn lit_rows(&self) -> &BTreeSet<usize> {
        &self.lit_rows
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Up to `limit` entries, newest first, skipping the `offset` newest.
    pub fn history_recent(&self, limit: usize, offset: usize) -> Vec<&HistoryEntry> {
        self.history.iter().rev().skip(offset).take(limit).collect()
    }

    pub fn help_open(&self) -> bool {
        self.help_open
    }

    pub fn history_open(&self) -> bool {
        self.history_open
    }

    pub fn history_offset(&self) -> usize {
        self.history_offset
    }

    pub(crate) fn close_help(&mut self) {
        self.help_open = false;
    }

    pub(crate) fn close_history(&mut self) {
        self.history_open = false;
    }

    pub fn handle_input(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::ToggleMenu => self.toggle_menu(),
            InputAction::ToggleHelp => {
                if self.scene == Scene::Machine {
                    self.history_open = false;
                    self.help_open = !self.help_open;
                }
                false
            }
            InputAction::ToggleHistory => {
                if self.scene == Scene::Machine {
                    self.help_open = false;
                    if !self.history_open {
                        self.history_offset = 0;
                    }
                    self.history_open = !self.history_open;
                }
                false
            }
            InputAction::HistoryUp => {
                if self.scene == Scene::Machine && self.history_open {
                    let max_offset = self.history.len().saturating_sub(Self::HISTORY_PAGE_SIZE);
                    self.history_offset = (self.history_offset + 1).min(max_offset);
                }
                false
            }
            InputAction::HistoryDown => {
                if self.scene == Scene::Machine && self.history_open && self.history_offset > 0 {
                    self.history_offset -= 1;
                }
                false
            }
            InputAction::MenuNext => {
                if self.scene == Scene::Menu {
                    self.menu_next();
                }
                false
            }
            InputAction::MenuPrev => {
                if self.scene == Scene::Menu {
                    self.menu_prev();
                }
                false
            }
            InputAction::MenuInc => {
                if self.scene == Scene::Menu {
                    self.menu_inc();
                }
                false
            }
            InputAction::MenuDec => {
                if self.scene == Scene::Menu {
                    self.menu_dec();
                }
                false
            }
            InputAction::MenuApply => self.scene == Scene::Menu && self.apply_menu(),
            InputAction::MenuCancel => {
                if self.scene == Scene::Menu {
                    self.cancel_menu();
                }
                false
            }
            InputAction::Spin => self.request_spin(false),
            InputAction::ForceWin => self.request_spin(true),
            InputAction::BetUp => self.change_bet(true),
            InputAction::BetDown => self.change_bet(false),
        }
    }

    fn request_spin(&mut self, force_win: bool) -> bool {
        if self.scene != Scene::Machine || self.help_open || self.history_open {
            return false;
        }
        if self.state() != GameState::Idle {
            return false;
        }
        let forced = if force_win { Some(self.coordinator.winning_grid()) } else { None };
        self.coordinator.request_spin(forced);
        true
    }

    fn change_bet(&mut self, up: bool) -> bool {
        if self.scene != Scene::Machine {
            return false;
        }
        let step = i64::try_from(self.coordinator.controller().bet_increment()).unwrap_or(i64::MAX);
        let before = self.bet();
        let delta = if up { step } else { -step };
        matches!(self.coordinator.adjust_bet(delta), Some(bet) if bet != before)
    }

    /// Drive the coordinator and the reels to `now`.
    pub fn on_tick(&mut self, now: Instant) {
        self.coordinator.tick(now);
        self.drain_feed(now);

        let mut landed = false;
        for (reel, view) in self.reels.iter_mut().enumerate() {
            if view.update(now, &self.render_timing) {
                self.bus.publish(UiEvent::ReelSpinCompleted { reel });
                landed = true;
            }
        }
        if landed {
            self.coordinator.tick(now);
            self.drain_feed(now);
        }

        self.lit_rows = match &self.highlight {
            Some(h) => h.lit_rows(now, &self.render_timing),
            None => BTreeSet::new(),
        };
    }

    fn drain_feed(&mut self, now: Instant) {
        while let Some(event) = self.feed.pop() {
            match event {
                UiEvent::SpinStarted { bet, .. } => {
                    self.charged_bet = bet;
                    self.highlight = None;
                    self.last_lines.clear();
                    self.status = None;
                }
                UiEvent::ReelSpinStarted { reel, target } => {
                    let ids: Vec<SymbolId> = target.iter().map(|s| s.id).collect();
                    match self.reels.get_mut(reel) {
                        Some(view) => {
                            view.start(&ids, now, &self.render_timing, self.ui_rng.as_mut());
                        }
                        None => log::warn!("No reel {reel} to spin"),
                    }
                }
                UiEvent::WinOccurred { winning_rows, line_wins, .. } => {
                    self.highlight = Some(WinHighlight::new(winning_rows, now));
                    self.last_lines = line_wins;
                }
                UiEvent::SpinCompleted { result, total_winnings, final_balance } => {
                    self.last_win = total_winnings;
                    self.spins_played += 1;
                    let lines = result
                        .line_wins
                        .iter()
                        .map(|w| format!("{}: {}", w.payline_id, w.explanation))
                        .collect();
                    self.history.push_back(HistoryEntry {
                        number: self.spins_played,
                        bet: self.charged_bet,
                        winnings: total_winnings,
                        balance: final_balance,
                        lines,
                    });
                    if self.history.len() > Self::HISTORY_LIMIT {
                        self.history.pop_front();
                    }
                }
                UiEvent::GameStateChanged { new_state: GameState::InsufficientBalance, .. } => {
                    self.set_status("Insufficient balance. Press M to reset the machine.");
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spin_is_ignored_outside_machine_scene() {
        let mut app = AppState::seeded(SlotConfig::default(), 4).unwrap();
        assert_eq!(app.scene, Scene::Menu);
        assert!(!app.handle_input(InputAction::Spin));
        app.on_tick(Instant::now());
        assert_eq!(app.balance(), 100);
    }

    #[test]
    fn full_spin_settles_through_reel_reports() {
        let mut app = AppState::seeded(SlotConfig::default(), 4).unwrap();
        app.scene = Scene::Machine;
        let t0 = Instant::now();
        assert!(app.handle_input(InputAction::Spin));
        app.on_tick(t0);
        assert_eq!(app.state(), GameState::Spinning);
        assert_eq!(app.balance(), 90);
        for step in 1..=40 {
            app.on_tick(t0 + Duration::from_millis(step * 100));
        }
        assert!(!app.reels_spinning());
        assert_eq!(app.state(), GameState::Idle);
        assert_eq!(app.history_len(), 1);
        let entry = app.history_recent(1, 0)[0];
        assert_eq!(entry.bet, 10);
        assert_eq!(entry.balance, app.balance());
    }

    #[test]
    fn history_keeps_the_most_recent_entries() {
        let mut app = AppState::seeded(SlotConfig::default(), 4).unwrap();
        let lemon = crate::symbols::find_symbol(&app.config.symbols, SymbolId::Lemon).unwrap();
        let result =
            app.coordinator().controller().engine().evaluate(crate::grid::Grid::filled(5, 5, lemon));
        let total = AppState::HISTORY_LIMIT + 5;
        for n in 0..total {
            app.bus().publish(UiEvent::SpinCompleted {
                result: result.clone(),
                total_winnings: 0,
                final_balance: n as u64,
            });
        }
        app.on_tick(Instant::now());
        assert_eq!(app.history_len(), AppState::HISTORY_LIMIT);
        let all = app.history_recent(AppState::HISTORY_LIMIT, 0);
        assert_eq!(all[0].balance, (total - 1) as u64);
        assert_eq!(all[AppState::HISTORY_LIMIT - 1].balance, 5);
    }
}
