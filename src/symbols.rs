use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reel symbol identities, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SymbolId {
    Cherry = 0,
    Lemon = 1,
    Plum = 2,
    Bell = 3,
    Bar = 4,
    Diamond = 5,
    Seven = 6,
    Wild = 7,
}

impl SymbolId {
    pub const ALL: [SymbolId; 8] = [
        SymbolId::Cherry,
        SymbolId::Lemon,
        SymbolId::Plum,
        SymbolId::Bell,
        SymbolId::Bar,
        SymbolId::Diamond,
        SymbolId::Seven,
        SymbolId::Wild,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SymbolId::Cherry => "CHERRY",
            SymbolId::Lemon => "LEMON",
            SymbolId::Plum => "PLUM",
            SymbolId::Bell => "BELL",
            SymbolId::Bar => "BAR",
            SymbolId::Diamond => "DIAMOND",
            SymbolId::Seven => "SEVEN",
            SymbolId::Wild => "WILD",
        }
    }

    /// Short glyph used by the terminal renderer.
    pub const fn glyph(self) -> &'static str {
        match self {
            SymbolId::Cherry => "CHR",
            SymbolId::Lemon => "LEM",
            SymbolId::Plum => "PLM",
            SymbolId::Bell => "BEL",
            SymbolId::Bar => "BAR",
            SymbolId::Diamond => "DIA",
            SymbolId::Seven => " 7 ",
            SymbolId::Wild => "WLD",
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SymbolParseError {
    #[error("invalid symbol: '{0}'")]
    Invalid(String),
}

impl FromStr for SymbolId {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        SymbolId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == upper)
            .ok_or_else(|| SymbolParseError::Invalid(s.to_string()))
    }
}

/// Config files may spell symbol names in any case.
impl<'de> Deserialize<'de> for SymbolId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A symbol as configured for play: identity, payout and draw weight.
///
/// Multipliers are whole numbers, so every payout is an exact multiple of
/// the bet. A config file with a fractional multiplier such as `2.5` is
/// rejected with [`ConfigError::Parse`](crate::config::ConfigError::Parse).
///
/// ```
/// use slot_rs::symbols::{Symbol, SymbolId};
///
/// let cherry = Symbol::new(SymbolId::Cherry, 3, 60.0);
/// assert!(!cherry.wild);
/// assert_eq!(cherry.multiplier, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub multiplier: u64,
    pub weight: f64,
    #[serde(default)]
    pub wild: bool,
}

impl Symbol {
    pub const fn new(id: SymbolId, multiplier: u64, weight: f64) -> Self {
        Self { id, multiplier, weight, wild: false }
    }

    pub const fn wild(id: SymbolId, multiplier: u64, weight: f64) -> Self {
        Self { id, multiplier, weight, wild: true }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// The shipped symbol table.
pub fn default_symbols() -> Vec<Symbol> {
    vec![
        Symbol::new(SymbolId::Cherry, 3, 60.0),
        Symbol::new(SymbolId::Lemon, 5, 40.0),
        Symbol::new(SymbolId::Plum, 8, 15.0),
        Symbol::new(SymbolId::Bell, 12, 5.0),
        Symbol::new(SymbolId::Bar, 18, 2.0),
        Symbol::new(SymbolId::Diamond, 25, 1.5),
        Symbol::new(SymbolId::Seven, 100, 0.5),
        Symbol::wild(SymbolId::Wild, 18, 2.0),
    ]
}

/// Look up a symbol by id in a table.
pub fn find_symbol(table: &[Symbol], id: SymbolId) -> Option<Symbol> {
    table.iter().copied().find(|s| s.id == id)
}
