use crate::symbols::Symbol;
use std::fmt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GridError {
    #[error("grid has no rows")]
    Empty,
    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, got: usize },
    #[error("cell count {cells} does not match {rows}x{columns}")]
    CellCount { rows: usize, columns: usize, cells: usize },
}

/// A fully populated rows x columns window of symbols, stored row-major.
///
/// ```
/// use slot_rs::grid::Grid;
/// use slot_rs::symbols::{Symbol, SymbolId};
///
/// let cherry = Symbol::new(SymbolId::Cherry, 3, 60.0);
/// let grid = Grid::filled(2, 3, cherry);
/// assert_eq!(grid.rows(), 2);
/// assert_eq!(grid.columns(), 3);
/// assert_eq!(grid.get(1, 2).map(|s| s.id), Some(SymbolId::Cherry));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Symbol>,
}

impl Grid {
    pub fn filled(rows: usize, columns: usize, symbol: Symbol) -> Self {
        Self { rows, columns, cells: vec![symbol; rows * columns] }
    }

    /// Build from a row-major cell vector.
    pub fn try_new(rows: usize, columns: usize, cells: Vec<Symbol>) -> Result<Self, GridError> {
        if rows == 0 || columns == 0 {
            return Err(GridError::Empty);
        }
        if cells.len() != rows * columns {
            return Err(GridError::CellCount { rows, columns, cells: cells.len() });
        }
        Ok(Self { rows, columns, cells })
    }

    pub(crate) fn from_cells(rows: usize, columns: usize, cells: Vec<Symbol>) -> Self {
        debug_assert_eq!(cells.len(), rows * columns);
        Self { rows, columns, cells }
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Symbol>>) -> Result<Self, GridError> {
        let columns = rows.first().map(Vec::len).ok_or(GridError::Empty)?;
        let n_rows = rows.len();
        let mut cells = Vec::with_capacity(n_rows * columns);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != columns {
                return Err(GridError::RaggedRow { row: r, expected: columns, got: row.len() });
            }
            cells.extend(row);
        }
        Self::try_new(n_rows, columns, cells)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Symbol> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    pub fn set(&mut self, row: usize, column: usize, symbol: Symbol) {
        if row < self.rows && column < self.columns {
            self.cells[row * self.columns + column] = symbol;
        }
    }

    /// Symbols of one row, left to right. `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[Symbol]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.columns;
        self.cells.get(start..start + self.columns)
    }

    /// Symbols of one column, top to bottom.
    pub fn column(&self, column: usize) -> Vec<Symbol> {
        (0..self.rows).filter_map(|r| self.get(r, column).copied()).collect()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.cells
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.columns.max(1)) {
            let names: Vec<&str> = row.iter().map(|s| s.id.as_str()).collect();
            writeln!(f, "{}", names.join(" "))?;
        }
        Ok(())
    }
}
