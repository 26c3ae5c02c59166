//! Static game configuration.
//!
//! Loaded once (defaults or JSON), validated, and handed to the engine,
//! ledger and coordinator at construction. Nothing here changes afterwards.

use crate::symbols::{default_symbols, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GRID_ROWS: usize = 5;
pub const GRID_COLUMNS: usize = 5;
pub const MIN_BET: u64 = 10;
pub const BET_INCREMENT: u64 = 10;
pub const INITIAL_BALANCE: u64 = 100;
pub const REEL_STAGGER_MS: u64 = 100;
pub const WIN_DISPLAY_MS: u64 = 100;

/// Environment variable naming the binary's log file.
pub const LOG_FILE_ENV: &str = "SLOT_RS_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "slot-rs.log";

/// Where the terminal binary writes its log records: `override_path` when
/// set and non-empty, otherwise `slot-rs.log` in the temp directory.
pub fn log_file_path(override_path: Option<OsString>) -> PathBuf {
    match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(DEFAULT_LOG_FILE),
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("configuration must include a WILD symbol")]
    MissingWild,
    #[error("configuration must include exactly one WILD symbol, found {0}")]
    MultipleWilds(usize),
    #[error("symbol table is empty")]
    EmptySymbolTable,
    #[error("duplicate symbol in table: {0}")]
    DuplicateSymbol(String),
    #[error("invalid weight for {symbol}: {weight}")]
    InvalidWeight { symbol: String, weight: String },
    #[error("total symbol weight must be positive")]
    ZeroTotalWeight,
    #[error("multiplier for {0} must be positive")]
    ZeroMultiplier(String),
    #[error("grid must have at least one row and one column, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("invalid payline {id}: {reason}")]
    InvalidPayline { id: String, reason: String },
    #[error("invalid bet limits: {0}")]
    InvalidBetLimits(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("config read error: {0}")]
    Io(String),
}

/// Betting limits and starting ledger values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetLimits {
    pub min_bet: u64,
    pub bet_increment: u64,
    pub initial_balance: u64,
    pub initial_bet: u64,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min_bet: MIN_BET,
            bet_increment: BET_INCREMENT,
            initial_balance: INITIAL_BALANCE,
            initial_bet: MIN_BET,
        }
    }
}

/// Coordinator timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Offset between consecutive reel starts.
    pub reel_stagger_ms: u64,
    /// How long the coordinator stays in `showing-win` before going idle.
    pub win_display_ms: u64,
}

impl Timing {
    pub fn reel_stagger(&self) -> Duration {
        Duration::from_millis(self.reel_stagger_ms)
    }

    pub fn win_display(&self) -> Duration {
        Duration::from_millis(self.win_display_ms)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self { reel_stagger_ms: REEL_STAGGER_MS, win_display_ms: WIN_DISPLAY_MS }
    }
}

/// Full configuration surface consumed by the core.
///
/// ```
/// use slot_rs::config::SlotConfig;
///
/// let cfg = SlotConfig::from_json_str(r#"{ "rows": 3, "columns": 3 }"#).unwrap();
/// assert_eq!(cfg.rows, 3);
/// assert_eq!(cfg.betting.min_bet, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub rows: usize,
    pub columns: usize,
    pub symbols: Vec<Symbol>,
    pub betting: BetLimits,
    pub timing: Timing,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            columns: GRID_COLUMNS,
            symbols: default_symbols(),
            betting: BetLimits::default(),
            timing: Timing::default(),
        }
    }
}

impl SlotConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: SlotConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let cfg = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::InvalidDimensions { rows: self.rows, columns: self.columns });
        }
        validate_symbols(&self.symbols)?;
        let b = &self.betting;
        if b.min_bet == 0 {
            return Err(ConfigError::InvalidBetLimits("min_bet must be positive".to_string()));
        }
        if b.bet_increment == 0 {
            return Err(ConfigError::InvalidBetLimits(
                "bet_increment must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check a symbol table: non-empty, unique ids, sane weights and
/// multipliers, exactly one wild.
pub fn validate_symbols(symbols: &[Symbol]) -> Result<(), ConfigError> {
    if symbols.is_empty() {
        return Err(ConfigError::EmptySymbolTable);
    }
    let mut seen = HashSet::new();
    for s in symbols {
        if !seen.insert(s.id) {
            return Err(ConfigError::DuplicateSymbol(s.id.to_string()));
        }
        if !s.weight.is_finite() || s.weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                symbol: s.id.to_string(),
                weight: s.weight.to_string(),
            });
        }
        if s.multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier(s.id.to_string()));
        }
    }
    if symbols.iter().map(|s| s.weight).sum::<f64>() <= 0.0 {
        return Err(ConfigError::ZeroTotalWeight);
    }
    match symbols.iter().filter(|s| s.wild).count() {
        0 => Err(ConfigError::MissingWild),
        1 => Ok(()),
        n => Err(ConfigError::MultipleWilds(n)),
    }
}
