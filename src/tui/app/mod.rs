mod menu;
mod state;

pub use state::{AppState, HistoryEntry, InputAction, Scene};
