// Spin resolution: grid generation and payline evaluation. The engine knows
// nothing about money; the ledger in `game` multiplies its results by the bet.

use crate::config::{validate_symbols, ConfigError, SlotConfig};
use crate::grid::Grid;
use crate::payline::{evaluate_line, horizontal_paylines, LineWin, Payline};
use crate::picker::WeightedPicker;
use crate::rng::RandomSource;
use crate::symbols::{Symbol, SymbolId};
use std::collections::HashSet;
use std::fmt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpinError {
    #[error("forced grid is {rows}x{columns}, expected {expected_rows}x{expected_columns}")]
    GridShape { expected_rows: usize, expected_columns: usize, rows: usize, columns: usize },
}

/// A resolved spin. Line wins follow payline order.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct SpinResult {
    pub grid: Grid,
    pub line_wins: Vec<LineWin>,
    pub total_multiplier: u64,
}

impl SpinResult {
    pub fn is_win(&self) -> bool {
        !self.line_wins.is_empty()
    }
}

pub struct SlotEngine {
    rows: usize,
    columns: usize,
    symbols: Vec<Symbol>,
    wild: SymbolId,
    paylines: Vec<Payline>,
    picker: WeightedPicker<Symbol>,
    rng: Box<dyn RandomSource>,
}

impl fmt::Debug for SlotEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotEngine")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("wild", &self.wild)
            .field("paylines", &self.paylines.len())
            .finish_non_exhaustive()
    }
}

impl SlotEngine {
    /// Build an engine with one horizontal payline per row.
    pub fn new(config: &SlotConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        if config.rows == 0 || config.columns == 0 {
            return Err(ConfigError::InvalidDimensions {
                rows: config.rows,
                columns: config.columns,
            });
        }
        validate_symbols(&config.symbols)?;
        let wild = config
            .symbols
            .iter()
            .find(|s| s.wild)
            .map(|s| s.id)
            .ok_or(ConfigError::MissingWild)?;
        let picker = WeightedPicker::new(config.symbols.iter().map(|s| (*s, s.weight)).collect())?;
        Ok(Self {
            rows: config.rows,
            columns: config.columns,
            symbols: config.symbols.clone(),
            wild,
            paylines: horizontal_paylines(config.rows, config.columns),
            picker,
            rng,
        })
    }

    /// Replace the default paylines with custom paths.
    pub fn with_paylines(mut self, paylines: Vec<Payline>) -> Result<Self, ConfigError> {
        if paylines.is_empty() {
            return Err(ConfigError::InvalidPayline {
                id: String::new(),
                reason: "at least one payline is required".to_string(),
            });
        }
        let mut ids = HashSet::new();
        for line in &paylines {
            if !ids.insert(line.id.as_str()) {
                return Err(ConfigError::InvalidPayline {
                    id: line.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
            if line.rows_by_column.len() != self.columns {
                return Err(ConfigError::InvalidPayline {
                    id: line.id.clone(),
                    reason: format!(
                        "expected {} rows, got {}",
                        self.columns,
                        line.rows_by_column.len()
                    ),
                });
            }
            if let Some(&r) = line.rows_by_column.iter().find(|&&r| r >= self.rows) {
                return Err(ConfigError::InvalidPayline {
                    id: line.id.clone(),
                    reason: format!("row {r} out of range"),
                });
            }
        }
        self.paylines = paylines;
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn wild(&self) -> SymbolId {
        self.wild
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    pub fn validate_grid(&self, grid: &Grid) -> Result<(), SpinError> {
        if grid.rows() != self.rows || grid.columns() != self.columns {
            return Err(SpinError::GridShape {
                expected_rows: self.rows,
                expected_columns: self.columns,
                rows: grid.rows(),
                columns: grid.columns(),
            });
        }
        Ok(())
    }

    /// Resolve a spin. A forced grid is used verbatim once its shape checks out.
    pub fn spin(&mut self, forced: Option<Grid>) -> Result<SpinResult, SpinError> {
        let grid = match forced {
            Some(grid) => {
                self.validate_grid(&grid)?;
                grid
            }
            None => self.random_grid(),
        };
        Ok(self.evaluate(grid))
    }

    /// Evaluate every payline against `grid`.
    pub fn evaluate(&self, grid: Grid) -> SpinResult {
        let mut line_wins = Vec::new();
        let mut total_multiplier = 0u64;
        for line in &self.paylines {
            let Some(win) = evaluate_line(&line.symbols(&grid), self.wild) else {
                continue;
            };
            total_multiplier = total_multiplier.saturating_add(win.multiplier);
            line_wins.push(LineWin {
                payline_id: line.id.clone(),
                symbol: win.symbol,
                multiplier: win.multiplier,
                explanation: win.explanation,
            });
        }
        SpinResult { grid, line_wins, total_multiplier }
    }

    /// Independent weighted draw for every cell.
    pub fn random_grid(&mut self) -> Grid {
        let mut cells = Vec::with_capacity(self.rows * self.columns);
        for _ in 0..self.rows * self.columns {
            cells.push(*self.picker.pick(self.rng.as_mut()));
        }
        Grid::from_cells(self.rows, self.columns, cells)
    }

    /// A grid where one random row is a single repeated symbol, so at least
    /// one horizontal line pays. Used by the forced-win demo trigger.
    pub fn winning_grid(&mut self) -> Grid {
        let mut grid = self.random_grid();
        let row = self.rng.int(0, self.rows as i64 - 1) as usize;
        let symbol = *self.picker.pick(self.rng.as_mut());
        for c in 0..self.columns {
            grid.set(row, c, symbol);
        }
        grid
    }
}
