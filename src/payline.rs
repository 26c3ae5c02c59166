//! Paylines and line evaluation.
//!
//! A line pays when every non-wild symbol on it shares one identity. Wilds
//! stand in for that identity without changing its multiplier; a line of
//! nothing but wilds pays the wild's own multiplier.

use crate::grid::Grid;
use crate::symbols::{Symbol, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const ROW_PREFIX: &str = "ROW";

/// A path through the grid: one row index per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    pub id: String,
    pub rows_by_column: Vec<usize>,
}

impl Payline {
    pub fn new(id: impl Into<String>, rows_by_column: Vec<usize>) -> Self {
        Self { id: id.into(), rows_by_column }
    }

    /// Straight line across `row`, named `ROW_<row>`.
    pub fn horizontal(row: usize, columns: usize) -> Self {
        Self::new(format!("{ROW_PREFIX}_{row}"), vec![row; columns])
    }

    /// Symbols along the line, left to right.
    pub fn symbols(&self, grid: &Grid) -> Vec<Symbol> {
        self.rows_by_column
            .iter()
            .enumerate()
            .filter_map(|(c, &r)| grid.get(r, c).copied())
            .collect()
    }
}

/// One horizontal line per row, top row first.
pub fn horizontal_paylines(rows: usize, columns: usize) -> Vec<Payline> {
    (0..rows).map(|r| Payline::horizontal(r, columns)).collect()
}

/// A winning payline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    pub payline_id: String,
    pub symbol: SymbolId,
    pub multiplier: u64,
    pub explanation: String,
}

/// Outcome of evaluating a single winning line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvaluation {
    pub symbol: SymbolId,
    pub multiplier: u64,
    pub explanation: String,
}

/// Evaluate one line. `None` means the line does not pay.
///
/// ```
/// use slot_rs::payline::evaluate_line;
/// use slot_rs::symbols::{Symbol, SymbolId};
///
/// let cherry = Symbol::new(SymbolId::Cherry, 3, 60.0);
/// let wild = Symbol::wild(SymbolId::Wild, 18, 2.0);
/// let win = evaluate_line(&[cherry, wild, cherry], SymbolId::Wild).unwrap();
/// assert_eq!(win.multiplier, 3);
/// assert_eq!(win.explanation, "CHERRY with WILD substitution");
/// ```
pub fn evaluate_line(symbols: &[Symbol], wild: SymbolId) -> Option<LineEvaluation> {
    let first = symbols.first()?;
    let mut non_wild = symbols.iter().filter(|s| s.id != wild);

    let Some(base) = non_wild.next() else {
        return Some(LineEvaluation {
            symbol: wild,
            multiplier: first.multiplier,
            explanation: format!("All {wild} symbols"),
        });
    };

    if !non_wild.all(|s| s.id == base.id) {
        return None;
    }

    let has_wild = symbols.iter().any(|s| s.id == wild);
    let explanation = if has_wild {
        format!("{} with {wild} substitution", base.id)
    } else {
        format!("All {}", base.id)
    };
    Some(LineEvaluation { symbol: base.id, multiplier: base.multiplier, explanation })
}

/// Row index encoded in a payline id such as `ROW_3`.
pub fn row_from_payline_id(id: &str) -> Option<usize> {
    let (prefix, row) = id.split_once('_')?;
    if prefix != ROW_PREFIX {
        return None;
    }
    row.parse().ok()
}

/// Distinct rows covered by a set of line wins. Ids that do not encode a
/// row are skipped.
pub fn winning_rows(line_wins: &[LineWin]) -> BTreeSet<usize> {
    let mut rows = BTreeSet::new();
    for win in line_wins {
        match row_from_payline_id(&win.payline_id) {
            Some(row) => {
                rows.insert(row);
            }
            None => log::warn!("Payline id {:?} does not encode a row", win.payline_id),
        }
    }
    rows
}
