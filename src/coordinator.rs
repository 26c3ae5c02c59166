//! Spin lifecycle state machine.
//!
//! The coordinator owns the ledger and is the single authority on whether a
//! spin may start or the bet may change. It is driven cooperatively: inbound
//! requests arrive through a [`Mailbox`] on the shared bus and are handled,
//! together with any due timers, on each call to [`SpinCoordinator::tick`].
//!
//! ```text
//!  idle --spin ok--> spinning --all reels, win--> showing-win --timer--> idle
//!   |                    `-----all reels, no win-----------------------> idle
//!   `--cannot spin--> insufficient-balance
//! ```

use crate::config::Timing;
use crate::events::{EventBus, EventKind, GameState, Mailbox, UiEvent};
use crate::game::{GameController, LedgerError, PendingSpin};
use crate::grid::Grid;
use crate::payline::winning_rows;
use crate::symbols::Symbol;
use std::collections::BTreeSet;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
enum TimerAction {
    StartReel { reel: usize, target: Vec<Symbol> },
    ReturnToIdle,
}

#[derive(Debug, Clone)]
struct Timer {
    due: Instant,
    seq: u64,
    action: TimerAction,
}

#[derive(Debug)]
pub struct SpinCoordinator {
    controller: GameController,
    bus: EventBus,
    inbox: Mailbox,
    timing: Timing,
    columns: usize,
    state: GameState,
    started_reels: BTreeSet<usize>,
    completed_reels: BTreeSet<usize>,
    pending: Option<PendingSpin>,
    timers: Vec<Timer>,
    next_seq: u64,
}

impl SpinCoordinator {
    /// Attach to `bus` and announce the initial idle state.
    pub fn new(controller: GameController, bus: EventBus, timing: Timing) -> Self {
        let inbox = bus.mailbox(&[EventKind::SpinRequested, EventKind::ReelSpinCompleted]);
        let columns = controller.engine().columns();
        let mut coordinator = Self {
            controller,
            bus,
            inbox,
            timing,
            columns,
            state: GameState::Idle,
            started_reels: BTreeSet::new(),
            completed_reels: BTreeSet::new(),
            pending: None,
            timers: Vec::new(),
            next_seq: 0,
        };
        coordinator.transition(GameState::Idle);
        coordinator
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn can_spin(&self) -> bool {
        self.controller.can_place_spin() && self.state == GameState::Idle
    }

    pub fn can_change_bet(&self) -> bool {
        self.state == GameState::Idle
    }

    /// Columns that have reported completion for the spin in flight.
    pub fn completed_reels(&self) -> usize {
        self.completed_reels.len()
    }

    pub fn has_pending_spin(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduled_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest timer deadline, so a driver loop knows when to tick next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// A grid guaranteed to pay on at least one row, for forced-win requests.
    pub fn winning_grid(&mut self) -> Grid {
        self.controller.engine_mut().winning_grid()
    }

    /// Publish a spin request on the bus; it is handled on the next tick.
    pub fn request_spin(&self, forced_grid: Option<Grid>) {
        self.bus.publish(UiEvent::SpinRequested { forced_grid });
    }

    /// Adjust the bet while idle. Returns the resulting bet, or `None` when
    /// the current state does not allow bet changes.
    pub fn adjust_bet(&mut self, delta: i64) -> Option<u64> {
        if !self.can_change_bet() {
            return None;
        }
        let old_bet = self.controller.bet();
        let new_bet = self.controller.update_bet(delta);
        if new_bet != old_bet {
            self.bus.publish(UiEvent::BetChanged {
                old_bet,
                new_bet,
                balance: self.controller.balance(),
            });
        }
        Some(new_bet)
    }

    /// Handle queued requests and fire due timers until nothing is left to do at `now`.
    pub fn tick(&mut self, now: Instant) {
        loop {
            let mut progressed = false;
            while let Some(event) = self.inbox.pop() {
                self.handle(event, now);
                progressed = true;
            }
            if self.fire_next_due(now) {
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    /// Stop listening and cancel outstanding timers.
    pub fn shutdown(&mut self) {
        self.inbox.close();
        self.timers.clear();
    }

    fn handle(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::SpinRequested { forced_grid } => self.on_spin_requested(forced_grid, now),
            UiEvent::ReelSpinCompleted { reel } => self.on_reel_completed(reel, now),
            other => log::debug!("Coordinator ignoring {:?}", other.kind()),
        }
    }

    fn transition(&mut self, new_state: GameState) {
        let old_state = self.state;
        self.state = new_state;
        self.bus.publish(UiEvent::GameStateChanged {
            old_state,
            new_state,
            can_spin: self.controller.can_place_spin() && new_state == GameState::Idle,
            can_change_bet: new_state == GameState::Idle,
        });
    }

    fn schedule(&mut self, due: Instant, action: TimerAction) {
        self.next_seq += 1;
        self.timers.push(Timer { due, seq: self.next_seq, action });
    }

    fn fire_next_due(&mut self, now: Instant) -> bool {
        let next = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i);
        let Some(idx) = next else {
            return false;
        };
        let timer = self.timers.swap_remove(idx);
        match timer.action {
            TimerAction::StartReel { reel, target } => {
                self.started_reels.insert(reel);
                self.bus.publish(UiEvent::ReelSpinStarted { reel, target });
            }
            TimerAction::ReturnToIdle => self.transition(GameState::Idle),
        }
        true
    }

    fn on_spin_requested(&mut self, forced_grid: Option<Grid>, now: Instant) {
        if self.state != GameState::Idle {
            return;
        }
        if !self.controller.can_place_spin() {
            if forced_grid.is_some() {
                log::warn!("Cannot force win: insufficient balance");
            }
            self.transition(GameState::InsufficientBalance);
            return;
        }

        let pending = match self.controller.start_spin(forced_grid) {
            Ok(pending) => pending,
            Err(LedgerError::InsufficientBalance { .. }) => {
                self.transition(GameState::InsufficientBalance);
                return;
            }
            Err(err) => {
                log::error!("Spin rejected: {err}");
                return;
            }
        };

        log_outcome(&pending);
        self.reset_reels();
        let bet = pending.bet();
        let balance_after_bet = pending.balance_after_bet();
        let targets: Vec<Vec<Symbol>> =
            (0..self.columns).map(|c| pending.result().grid.column(c)).collect();
        self.pending = Some(pending);

        self.transition(GameState::Spinning);
        self.bus.publish(UiEvent::SpinStarted { bet, balance_after_bet });

        let stagger = self.timing.reel_stagger();
        for (reel, target) in targets.into_iter().enumerate() {
            let due = now + stagger * reel as u32;
            self.schedule(due, TimerAction::StartReel { reel, target });
        }
    }

    fn on_reel_completed(&mut self, reel: usize, now: Instant) {
        if self.state != GameState::Spinning {
            log::debug!("Reel {reel} completed outside a spin");
            return;
        }
        if !self.started_reels.contains(&reel) {
            log::debug!("Ignoring completion report for reel {reel} before it started");
            return;
        }
        if !self.completed_reels.insert(reel) {
            log::debug!("Ignoring completion report for reel {reel}");
            return;
        }
        if self.completed_reels.len() == self.columns {
            self.finish_spin(now);
        }
    }

    /// Forget the reel bookkeeping of the previous spin, including any reel
    /// starts still queued for it.
    fn reset_reels(&mut self) {
        self.started_reels.clear();
        self.completed_reels.clear();
        self.timers.retain(|t| !matches!(t.action, TimerAction::StartReel { .. }));
    }

    fn finish_spin(&mut self, now: Instant) {
        self.reset_reels();
        let Some(pending) = self.pending.take() else {
            log::error!("Spin complete but no result available");
            self.transition(GameState::Idle);
            return;
        };

        if let Err(err) = self.controller.commit(&pending) {
            log::error!("Settlement failed: {err}");
        }

        let total_winnings = pending.total_winnings();
        let result = pending.result().clone();
        let has_win = result.is_win();
        let line_wins = result.line_wins.clone();

        self.bus.publish(UiEvent::SpinCompleted {
            result,
            total_winnings,
            final_balance: self.controller.balance(),
        });

        if has_win {
            self.bus.publish(UiEvent::WinOccurred {
                winning_rows: winning_rows(&line_wins),
                line_wins,
                total_winnings,
            });
            self.transition(GameState::ShowingWin);
            self.schedule(now + self.timing.win_display(), TimerAction::ReturnToIdle);
        } else {
            self.transition(GameState::Idle);
        }
    }
}

impl Drop for SpinCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn log_outcome(pending: &PendingSpin) {
    let forced = pending.forced();
    let spin_type = if forced { "Forced WIN" } else { "Spinning" };
    let lines = pending.line_wins().len();
    let outcome = if lines > 0 { "WIN" } else { "LOSS" };
    log::info!("{spin_type}... {outcome} - {lines} line(s)");
    if pending.total_winnings() > 0 {
        let details: Vec<String> = pending
            .line_wins()
            .iter()
            .map(|w| format!("{}: {}", w.payline_id, w.explanation))
            .collect();
        log::info!(
            "{} {} | Total: {}, Balance: {}",
            if forced { "Forced WIN!" } else { "Win!" },
            details.join(", "),
            pending.total_winnings(),
            pending.final_balance()
        );
    } else {
        log::info!("No win. Balance: {}", pending.balance_after_bet());
    }
}
