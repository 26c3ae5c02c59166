//! Typed in-process notification bus.
//!
//! The core publishes [`UiEvent`]s; renderers subscribe by [`EventKind`].
//! Delivery is synchronous and in subscription order. A panicking subscriber
//! is logged and skipped; the remaining subscribers still receive the event.
//!
//! The bus is a cheap clonable handle. Components that need to react to
//! events from their own `&mut self` context take a [`Mailbox`] and drain it
//! on their next tick instead of handling events inside the callback.

use crate::engine::SpinResult;
use crate::grid::Grid;
use crate::payline::LineWin;
use crate::symbols::Symbol;
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Spin lifecycle states owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum GameState {
    Idle,
    Spinning,
    ShowingWin,
    InsufficientBalance,
}

impl GameState {
    pub fn label(self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Spinning => "spinning",
            GameState::ShowingWin => "showing-win",
            GameState::InsufficientBalance => "insufficient-balance",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum UiEvent {
    /// Inbound: start a spin, optionally with a caller-chosen grid.
    SpinRequested { forced_grid: Option<Grid> },
    SpinStarted { bet: u64, balance_after_bet: u64 },
    /// Column `reel` should animate to `target` (top to bottom).
    ReelSpinStarted { reel: usize, target: Vec<Symbol> },
    /// Inbound: the renderer finished animating column `reel`.
    ReelSpinCompleted { reel: usize },
    BetChanged { old_bet: u64, new_bet: u64, balance: u64 },
    WinOccurred { winning_rows: BTreeSet<usize>, line_wins: Vec<LineWin>, total_winnings: u64 },
    SpinCompleted { result: SpinResult, total_winnings: u64, final_balance: u64 },
    GameStateChanged {
        old_state: GameState,
        new_state: GameState,
        can_spin: bool,
        can_change_bet: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum EventKind {
    SpinRequested,
    SpinStarted,
    ReelSpinStarted,
    ReelSpinCompleted,
    BetChanged,
    WinOccurred,
    SpinCompleted,
    GameStateChanged,
}

impl EventKind {
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::SpinRequested => "spin:requested",
            EventKind::SpinStarted => "spin:started",
            EventKind::ReelSpinStarted => "reel:spin:started",
            EventKind::ReelSpinCompleted => "reel:spin:completed",
            EventKind::BetChanged => "bet:changed",
            EventKind::WinOccurred => "win:occurred",
            EventKind::SpinCompleted => "spin:completed",
            EventKind::GameStateChanged => "game:state:changed",
        }
    }
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::SpinRequested { .. } => EventKind::SpinRequested,
            UiEvent::SpinStarted { .. } => EventKind::SpinStarted,
            UiEvent::ReelSpinStarted { .. } => EventKind::ReelSpinStarted,
            UiEvent::ReelSpinCompleted { .. } => EventKind::ReelSpinCompleted,
            UiEvent::BetChanged { .. } => EventKind::BetChanged,
            UiEvent::WinOccurred { .. } => EventKind::WinOccurred,
            UiEvent::SpinCompleted { .. } => EventKind::SpinCompleted,
            UiEvent::GameStateChanged { .. } => EventKind::GameStateChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<dyn FnMut(&UiEvent)>>;

struct Entry {
    id: SubscriptionId,
    kind: EventKind,
    once: bool,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Shared handle to one notification bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.inner.borrow();
        write!(f, "EventBus({} listeners)", reg.entries.len())
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, kind: EventKind, once: bool, listener: Listener) -> SubscriptionId {
        let mut reg = self.inner.borrow_mut();
        reg.next_id += 1;
        let id = SubscriptionId(reg.next_id);
        reg.entries.push(Entry { id, kind, once, listener });
        id
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&UiEvent) + 'static,
    {
        self.register(kind, false, Rc::new(RefCell::new(callback)))
    }

    /// Subscribe for a single delivery.
    pub fn once<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&UiEvent) + 'static,
    {
        self.register(kind, true, Rc::new(RefCell::new(callback)))
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut reg = self.inner.borrow_mut();
        let before = reg.entries.len();
        reg.entries.retain(|e| e.id != id);
        reg.entries.len() != before
    }

    /// Drop every subscription for `kind`, or all of them.
    pub fn clear(&self, kind: Option<EventKind>) {
        let mut reg = self.inner.borrow_mut();
        match kind {
            Some(kind) => reg.entries.retain(|e| e.kind != kind),
            None => reg.entries.clear(),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.borrow().entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.id == id)
    }

    /// Deliver `event` to every current subscriber of its kind.
    pub fn publish(&self, event: UiEvent) {
        let kind = event.kind();
        let targets: Vec<(SubscriptionId, bool, Listener)> = {
            let mut reg = self.inner.borrow_mut();
            let targets = reg
                .entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| (e.id, e.once, Rc::clone(&e.listener)))
                .collect();
            reg.entries.retain(|e| !(e.once && e.kind == kind));
            targets
        };

        for (id, once, listener) in targets {
            // Unsubscribed by an earlier callback in this same delivery.
            if !once && !self.is_subscribed(id) {
                continue;
            }
            let Ok(mut callback) = listener.try_borrow_mut() else {
                log::warn!("Skipping re-entrant delivery of \"{}\"", kind.name());
                continue;
            };
            if catch_unwind(AssertUnwindSafe(|| (*callback)(&event))).is_err() {
                log::error!("Error in event handler for \"{}\"", kind.name());
            }
        }
    }

    /// Queue events of the given kinds for later draining.
    pub fn mailbox(&self, kinds: &[EventKind]) -> Mailbox {
        let queue: Rc<RefCell<VecDeque<UiEvent>>> = Rc::default();
        let subscriptions = kinds
            .iter()
            .map(|&kind| {
                let queue = Rc::clone(&queue);
                self.subscribe(kind, move |event| queue.borrow_mut().push_back(event.clone()))
            })
            .collect();
        Mailbox { bus: self.clone(), queue, subscriptions }
    }
}

/// Buffered subscription: events are queued on publish and handled when the
/// owner drains them. Unsubscribes on drop.
pub struct Mailbox {
    bus: EventBus,
    queue: Rc<RefCell<VecDeque<UiEvent>>>,
    subscriptions: Vec<SubscriptionId>,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mailbox({} queued, {} subs)", self.len(), self.subscriptions.len())
    }
}

impl Mailbox {
    pub fn pop(&self) -> Option<UiEvent> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_open(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Unsubscribe and discard anything still queued.
    pub fn close(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        self.queue.borrow_mut().clear();
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.close();
    }
}
