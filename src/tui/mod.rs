//! Terminal renderer. Consumes the coordinator's notifications, animates the
//! reels and reports per-column completion back over the bus. It holds no
//! game logic of its own.

pub mod app;
pub mod controller;
pub mod reels;
mod ui;
