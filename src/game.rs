use crate::config::{BetLimits, ConfigError, SlotConfig};
use crate::engine::{SlotEngine, SpinError, SpinResult};
use crate::grid::Grid;
use crate::payline::LineWin;
use crate::rng::RandomSource;
use std::collections::BTreeSet;

/// Identifies one charged-but-unsettled spin.
pub type SpinId = u64;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("cannot spin: balance {balance}, bet {bet}")]
    InsufficientBalance { balance: u64, bet: u64 },
    #[error("spin {0} was already settled")]
    AlreadySettled(SpinId),
    #[error("spin {0} was not started by this ledger")]
    UnknownSpin(SpinId),
    #[error(transparent)]
    Spin(#[from] SpinError),
}

/// A spin whose bet has been charged but whose winnings are not yet credited.
///
/// Hand it back to [`GameController::commit`] once the presentation has
/// finished. The ledger accepts each spin id exactly once.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PendingSpin {
    id: SpinId,
    result: SpinResult,
    bet: u64,
    total_winnings: u64,
    balance_after_bet: u64,
    final_balance: u64,
    forced: bool,
}

impl PendingSpin {
    pub fn id(&self) -> SpinId {
        self.id
    }

    pub fn result(&self) -> &SpinResult {
        &self.result
    }

    pub fn line_wins(&self) -> &[LineWin] {
        &self.result.line_wins
    }

    /// Amount charged when the spin started.
    pub fn bet(&self) -> u64 {
        self.bet
    }

    /// Winnings that commit will credit: total multiplier times bet.
    pub fn total_winnings(&self) -> u64 {
        self.total_winnings
    }

    pub fn balance_after_bet(&self) -> u64 {
        self.balance_after_bet
    }

    /// Projected balance once the winnings are credited.
    pub fn final_balance(&self) -> u64 {
        self.final_balance
    }

    /// Whether the grid was supplied by the caller.
    pub fn forced(&self) -> bool {
        self.forced
    }
}

/// Outcome of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Settlement {
    pub spin: SpinId,
    pub winnings: u64,
    pub balance: u64,
    pub bet: u64,
}

/// Balance and bet ledger wrapped around a [`SlotEngine`].
#[derive(Debug)]
#[non_exhaustive]
pub struct GameController {
    pub(crate) balance: u64,
    pub(crate) bet: u64,
    min_bet: u64,
    bet_increment: u64,
    engine: SlotEngine,
    next_spin: SpinId,
    open_spins: BTreeSet<SpinId>,
}

impl GameController {
    /// Build engine and ledger from a configuration.
    pub fn new(config: &SlotConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = SlotEngine::new(config, rng)?;
        Ok(Self::with_engine(engine, config.betting))
    }

    /// Wrap an existing engine. The initial bet is clamped into `[min_bet, balance]`.
    pub fn with_engine(engine: SlotEngine, limits: BetLimits) -> Self {
        let min_bet = limits.min_bet.max(1);
        let balance = limits.initial_balance;
        Self {
            balance,
            bet: limits.initial_bet.min(balance).max(min_bet),
            min_bet,
            bet_increment: limits.bet_increment.max(1),
            engine,
            next_spin: 1,
            open_spins: BTreeSet::new(),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn min_bet(&self) -> u64 {
        self.min_bet
    }

    pub fn bet_increment(&self) -> u64 {
        self.bet_increment
    }

    pub fn engine(&self) -> &SlotEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SlotEngine {
        &mut self.engine
    }

    /// Number of spins charged but not yet committed.
    pub fn open_spins(&self) -> usize {
        self.open_spins.len()
    }

    pub fn can_place_spin(&self) -> bool {
        self.balance > 0 && self.bet <= self.balance
    }

    pub fn can_increase_bet(&self) -> bool {
        self.bet < self.balance
    }

    pub fn can_decrease_bet(&self) -> bool {
        self.bet > self.min_bet
    }

    /// Move the bet by `delta`, clamped into `[min_bet, balance]`.
    /// Returns the resulting bet; out-of-range requests are clamped silently.
    pub fn update_bet(&mut self, delta: i64) -> u64 {
        let requested = if delta >= 0 {
            self.bet.saturating_add(delta.unsigned_abs())
        } else {
            self.bet.saturating_sub(delta.unsigned_abs())
        };
        self.bet = requested.min(self.balance).max(self.min_bet);
        self.bet
    }

    pub fn increase_bet(&mut self) -> u64 {
        self.update_bet(i64::try_from(self.bet_increment).unwrap_or(i64::MAX))
    }

    pub fn decrease_bet(&mut self) -> u64 {
        self.update_bet(-i64::try_from(self.bet_increment).unwrap_or(i64::MAX))
    }

    /// Charge the bet and resolve a spin. Winnings are computed but not
    /// credited until [`commit`](Self::commit).
    pub fn start_spin(&mut self, forced: Option<Grid>) -> Result<PendingSpin, LedgerError> {
        if !self.can_place_spin() {
            return Err(LedgerError::InsufficientBalance { balance: self.balance, bet: self.bet });
        }
        if let Some(grid) = forced.as_ref() {
            self.engine.validate_grid(grid)?;
        }
        let was_forced = forced.is_some();

        let bet = self.bet;
        self.balance -= bet;
        let balance_after_bet = self.balance;

        let result = self.engine.spin(forced)?;
        let total_winnings = result.total_multiplier.saturating_mul(bet);

        let id = self.next_spin;
        self.next_spin += 1;
        self.open_spins.insert(id);

        Ok(PendingSpin {
            id,
            result,
            bet,
            total_winnings,
            balance_after_bet,
            final_balance: balance_after_bet.saturating_add(total_winnings),
            forced: was_forced,
        })
    }

    /// Credit a pending spin's winnings. Each spin settles once; a repeat is
    /// rejected and leaves the ledger untouched.
    pub fn commit(&mut self, pending: &PendingSpin) -> Result<Settlement, LedgerError> {
        if !self.open_spins.remove(&pending.id) {
            return Err(if pending.id < self.next_spin {
                LedgerError::AlreadySettled(pending.id)
            } else {
                LedgerError::UnknownSpin(pending.id)
            });
        }
        self.balance = self.balance.saturating_add(pending.total_winnings);
        if self.bet > self.balance {
            self.bet = self.balance.max(self.min_bet);
        }
        Ok(Settlement {
            spin: pending.id,
            winnings: pending.total_winnings,
            balance: self.balance,
            bet: self.bet,
        })
    }
}
