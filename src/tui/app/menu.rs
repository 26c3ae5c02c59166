use super::{AppState, Scene};
use crate::events::GameState;

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    StartingBalance,
    MinBet,
    BetIncrement,
    ReelStaggerMs,
}

const MENU_ITEMS: [MenuItem; 4] = [
    MenuItem::StartingBalance,
    MenuItem::MinBet,
    MenuItem::BetIncrement,
    MenuItem::ReelStaggerMs,
];

const BALANCE_STEP: u64 = 50;
const BET_STEP: u64 = 5;
const STAGGER_STEP_MS: u64 = 50;
const MAX_STAGGER_MS: u64 = 1000;

impl MenuItem {
    fn display(self, app: &AppState) -> String {
        match self {
            MenuItem::StartingBalance => format!("Starting Balance: ${}", app.cfg_initial_balance),
            MenuItem::MinBet => format!("Min Bet: {}", app.cfg_min_bet),
            MenuItem::BetIncrement => format!("Bet Increment: {}", app.cfg_bet_increment),
            MenuItem::ReelStaggerMs => format!("Reel Stagger (ms): {}", app.cfg_reel_stagger_ms),
        }
    }

    fn inc(self, app: &mut AppState) {
        match self {
            MenuItem::StartingBalance => {
                app.cfg_initial_balance = app.cfg_initial_balance.saturating_add(BALANCE_STEP);
            }
            MenuItem::MinBet => {
                app.cfg_min_bet = app.cfg_min_bet.saturating_add(BET_STEP);
            }
            MenuItem::BetIncrement => {
                app.cfg_bet_increment = app.cfg_bet_increment.saturating_add(BET_STEP);
            }
            MenuItem::ReelStaggerMs => {
                app.cfg_reel_stagger_ms = (app.cfg_reel_stagger_ms + STAGGER_STEP_MS).min(MAX_STAGGER_MS);
            }
        }
    }

    fn dec(self, app: &mut AppState) {
        match self {
            MenuItem::StartingBalance => {
                app.cfg_initial_balance =
                    app.cfg_initial_balance.saturating_sub(BALANCE_STEP).max(BALANCE_STEP);
            }
            MenuItem::MinBet => {
                app.cfg_min_bet = app.cfg_min_bet.saturating_sub(BET_STEP).max(BET_STEP);
            }
            MenuItem::BetIncrement => {
                app.cfg_bet_increment = app.cfg_bet_increment.saturating_sub(BET_STEP).max(BET_STEP);
            }
            MenuItem::ReelStaggerMs => {
                app.cfg_reel_stagger_ms = app.cfg_reel_stagger_ms.saturating_sub(STAGGER_STEP_MS);
            }
        }
    }
}

impl AppState {
    pub fn menu_items_display(&self) -> Vec<String> {
        MENU_ITEMS.iter().map(|item| item.display(self)).collect()
    }

    /// Flip between the menu and the machine. The menu cannot be opened
    /// while a spin is in flight.
    pub fn toggle_menu(&mut self) -> bool {
        match self.scene {
            Scene::Menu => {
                self.cancel_menu();
                true
            }
            _ => self.open_menu(),
        }
    }

    // --- Menu operations ---
    pub fn open_menu(&mut self) -> bool {
        if matches!(self.state(), GameState::Spinning | GameState::ShowingWin) {
            return false;
        }
        self.close_help();
        self.close_history();
        self.menu_index = 0;
        self.cfg_initial_balance = self.config.betting.initial_balance;
        self.cfg_min_bet = self.config.betting.min_bet;
        self.cfg_bet_increment = self.config.betting.bet_increment;
        self.cfg_reel_stagger_ms = self.config.timing.reel_stagger_ms;
        self.scene = Scene::Menu;
        true
    }

    /// Rebuild the machine from the edited values and switch to it.
    pub fn apply_menu(&mut self) -> bool {
        if self.cfg_min_bet == 0 {
            self.cfg_min_bet = BET_STEP;
        }
        if self.cfg_bet_increment == 0 {
            self.cfg_bet_increment = BET_STEP;
        }

        let mut config = self.config.clone();
        config.betting.initial_balance = self.cfg_initial_balance;
        config.betting.min_bet = self.cfg_min_bet;
        config.betting.bet_increment = self.cfg_bet_increment;
        config.betting.initial_bet = self.cfg_min_bet;
        config.timing.reel_stagger_ms = self.cfg_reel_stagger_ms;

        if let Err(err) = self.rebuild(config) {
            log::error!("Menu settings rejected: {err}");
            self.set_status(err.to_string());
            return false;
        }
        self.scene = Scene::Machine;
        true
    }

    pub fn cancel_menu(&mut self) {
        self.scene = Scene::Machine;
    }

    pub fn menu_next(&mut self) {
        self.menu_index = (self.menu_index + 1) % MENU_ITEMS.len();
    }
    pub fn menu_prev(&mut self) {
        self.menu_index = (self.menu_index + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
    }
    pub fn menu_inc(&mut self) {
        let item = MENU_ITEMS[self.menu_index % MENU_ITEMS.len()];
        item.inc(self);
    }
    pub fn menu_dec(&mut self) {
        let item = MENU_ITEMS[self.menu_index % MENU_ITEMS.len()];
        item.dec(self);
    }
}
