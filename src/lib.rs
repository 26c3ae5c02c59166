//! slot-rs: slot machine spin engine, bet ledger and spin coordinator
//!
//! Goals:
//! - Weighted-random 5x5 grids and payline evaluation with a single wildcard
//! - A two-phase bet ledger: charge on spin start, credit exactly once on settle
//! - A cooperative lifecycle state machine that the renderer drives through events
//!
//! ## Quick start: resolve and settle a spin
//! ```
//! use slot_rs::config::SlotConfig;
//! use slot_rs::game::GameController;
//! use slot_rs::rng::SeededRandom;
//!
//! let cfg = SlotConfig::default();
//! let mut ledger = GameController::new(&cfg, Box::new(SeededRandom::new(7))).unwrap();
//! assert_eq!(ledger.balance(), 100);
//!
//! let pending = ledger.start_spin(None).unwrap();
//! assert_eq!(ledger.balance(), 90);
//!
//! let settled = ledger.commit(&pending).unwrap();
//! assert_eq!(settled.balance, 90 + pending.total_winnings());
//! assert!(ledger.commit(&pending).is_err());
//! ```
//!
//! ## TUI
//! Run the interactive TUI with:
//! ```sh
//! cargo run --bin slot-rs -- [config.json]
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod events;
pub mod game;
pub mod grid;
pub mod payline;
pub mod picker;
pub mod rng;
pub mod symbols;
pub mod tui;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
