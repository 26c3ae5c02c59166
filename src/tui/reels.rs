//! Reel animation for the terminal renderer.
//!
//! Each column scrolls over a circular [`ReelStrip`]. When the coordinator
//! announces a column's target symbols, they are written into the strip at
//! a random position and the view eases toward it over
//! [`RenderTiming::spin_duration`], wrapping the strip at least
//! [`RenderTiming::min_rotations`] times on the way.

use crate::rng::RandomSource;
use crate::symbols::{Symbol, SymbolId};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub const SPIN_DURATION_MS: u64 = 2000;
pub const BLINK_DURATION_MS: u64 = 2700;
pub const BLINK_INTERVAL_MS: u64 = 300;
pub const MIN_SPIN_ROTATIONS: usize = 2;

/// Renderer-only timing. The core never sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTiming {
    pub spin_ms: u64,
    pub blink_ms: u64,
    pub blink_interval_ms: u64,
    pub min_rotations: usize,
}

impl Default for RenderTiming {
    fn default() -> Self {
        Self {
            spin_ms: SPIN_DURATION_MS,
            blink_ms: BLINK_DURATION_MS,
            blink_interval_ms: BLINK_INTERVAL_MS,
            min_rotations: MIN_SPIN_ROTATIONS,
        }
    }
}

impl RenderTiming {
    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_ms)
    }

    pub fn blink_duration(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }
}

/// Starts fast, ends slow.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Circular strip of symbols. Every index is taken modulo the length.
///
/// ```
/// use slot_rs::symbols::SymbolId;
/// use slot_rs::tui::reels::ReelStrip;
///
/// let strip = ReelStrip::new(vec![SymbolId::Cherry, SymbolId::Bell, SymbolId::Seven]).unwrap();
/// assert_eq!(strip.get(4), SymbolId::Bell);
/// assert_eq!(strip.window(2, 3), vec![SymbolId::Seven, SymbolId::Cherry, SymbolId::Bell]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelStrip {
    cells: Vec<SymbolId>,
}

impl ReelStrip {
    /// `None` for an empty strip.
    pub fn new(cells: Vec<SymbolId>) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }
        Some(Self { cells })
    }

    /// Each symbol appears `ceil(weight)` times, shuffled. The strip is
    /// repeated until it holds more than `rows` cells so a target window can
    /// always be placed.
    pub fn weighted(symbols: &[Symbol], rows: usize, rng: &mut dyn RandomSource) -> Option<Self> {
        let mut cells: Vec<SymbolId> = Vec::new();
        for s in symbols {
            let copies = s.weight.ceil() as usize;
            cells.extend(std::iter::repeat(s.id).take(copies));
        }
        if cells.is_empty() {
            return None;
        }
        let base = cells.clone();
        while cells.len() <= rows {
            cells.extend_from_slice(&base);
        }
        // Fisher-Yates
        for i in (1..cells.len()).rev() {
            let j = rng.int(0, i as i64) as usize;
            cells.swap(i, j);
        }
        Some(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> SymbolId {
        self.cells[index % self.cells.len()]
    }

    /// `rows` consecutive symbols starting at `top`, wrapping.
    pub fn window(&self, top: usize, rows: usize) -> Vec<SymbolId> {
        (0..rows).map(|i| self.get(top + i)).collect()
    }

    /// Overwrite consecutive cells starting at `at`, wrapping.
    pub fn write(&mut self, at: usize, symbols: &[SymbolId]) {
        let len = self.cells.len();
        for (i, &id) in symbols.iter().enumerate() {
            self.cells[(at + i) % len] = id;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SpinAnimation {
    started: Instant,
    start_top: usize,
    distance: usize,
}

/// One animated column.
#[derive(Debug, Clone)]
pub struct ReelView {
    strip: ReelStrip,
    rows: usize,
    top: usize,
    spin: Option<SpinAnimation>,
}

impl ReelView {
    pub fn new(strip: ReelStrip, rows: usize, top: usize) -> Self {
        let top = top % strip.len();
        Self { strip, rows, top, spin: None }
    }

    pub fn strip(&self) -> &ReelStrip {
        &self.strip
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    /// Strip index currently shown in the top row.
    pub fn top(&self) -> usize {
        self.top
    }

    /// Symbols currently in view, top to bottom.
    pub fn visible(&self) -> Vec<SymbolId> {
        self.strip.window(self.top, self.rows)
    }

    /// Begin scrolling toward `target`. Ignored while already spinning.
    pub fn start(
        &mut self,
        target: &[SymbolId],
        now: Instant,
        timing: &RenderTiming,
        rng: &mut dyn RandomSource,
    ) -> bool {
        if self.spin.is_some() {
            return false;
        }
        let len = self.strip.len();
        let max_inject = len.saturating_sub(self.rows + 1) as i64;
        let inject = rng.int(0, max_inject) as usize;
        self.strip.write(inject, target);

        // Symbols travel downward, so the top index walks backwards.
        let mut distance = (self.top + len - inject) % len;
        if distance == 0 {
            distance = len;
        }
        distance += timing.min_rotations * len;
        self.spin = Some(SpinAnimation { started: now, start_top: self.top, distance });
        true
    }

    /// Advance the animation. Returns true exactly once, on the update that
    /// lands the reel on its target.
    pub fn update(&mut self, now: Instant, timing: &RenderTiming) -> bool {
        let Some(anim) = self.spin else {
            return false;
        };
        let elapsed = now.saturating_duration_since(anim.started);
        let progress = if timing.spin_ms == 0 {
            1.0
        } else {
            elapsed.as_secs_f64() / timing.spin_duration().as_secs_f64()
        };
        let len = self.strip.len();
        let travelled = if progress >= 1.0 {
            anim.distance
        } else {
            ((anim.distance as f64) * ease_out_cubic(progress)).floor() as usize
        };
        self.top = (anim.start_top + len - travelled % len) % len;
        if travelled >= anim.distance {
            self.spin = None;
            return true;
        }
        false
    }
}

/// Winning-row highlight that blinks, then stays lit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinHighlight {
    rows: BTreeSet<usize>,
    started: Instant,
}

impl WinHighlight {
    pub fn new(rows: BTreeSet<usize>, started: Instant) -> Self {
        Self { rows, started }
    }

    pub fn rows(&self) -> &BTreeSet<usize> {
        &self.rows
    }

    pub fn is_lit(&self, now: Instant, timing: &RenderTiming) -> bool {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= timing.blink_duration() || timing.blink_interval_ms == 0 {
            return true;
        }
        (elapsed.as_millis() / u128::from(timing.blink_interval_ms)) % 2 == 0
    }

    /// Rows to draw highlighted at `now`.
    pub fn lit_rows(&self, now: Instant, timing: &RenderTiming) -> BTreeSet<usize> {
        if self.is_lit(now, timing) {
            self.rows.clone()
        } else {
            BTreeSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;
    use crate::symbols::default_symbols;

    #[test]
    fn weighted_strip_matches_weights() {
        let mut rng = SeededRandom::new(3);
        let strip = ReelStrip::weighted(&default_symbols(), 5, &mut rng).unwrap();
        assert_eq!(strip.len(), 127);
        let sevens = (0..strip.len()).filter(|&i| strip.get(i) == SymbolId::Seven).count();
        assert_eq!(sevens, 1);
    }

    #[test]
    fn tiny_table_is_padded_past_the_window() {
        let mut rng = SeededRandom::new(3);
        let table = [Symbol::wild(SymbolId::Wild, 2, 1.0)];
        let strip = ReelStrip::weighted(&table, 5, &mut rng).unwrap();
        assert!(strip.len() > 5);
    }

    #[test]
    fn write_wraps_around() {
        let mut strip = ReelStrip::new(vec![SymbolId::Cherry; 4]).unwrap();
        strip.write(3, &[SymbolId::Bar, SymbolId::Bell]);
        assert_eq!(strip.get(3), SymbolId::Bar);
        assert_eq!(strip.get(0), SymbolId::Bell);
    }

    #[test]
    fn ease_is_monotonic_and_bounded() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn reel_lands_on_target() {
        let mut rng = SeededRandom::new(11);
        let strip = ReelStrip::weighted(&default_symbols(), 5, &mut rng).unwrap();
        let mut reel = ReelView::new(strip, 5, 17);
        let timing = RenderTiming::default();
        let target = vec![
            SymbolId::Seven,
            SymbolId::Wild,
            SymbolId::Seven,
            SymbolId::Diamond,
            SymbolId::Bar,
        ];
        let t0 = Instant::now();
        assert!(reel.start(&target, t0, &timing, &mut rng));
        assert!(!reel.start(&target, t0, &timing, &mut rng));
        assert!(!reel.update(t0 + Duration::from_millis(500), &timing));
        assert!(reel.is_spinning());
        assert!(reel.update(t0 + Duration::from_millis(2000), &timing));
        assert!(!reel.is_spinning());
        assert_eq!(reel.visible(), target);
        assert!(!reel.update(t0 + Duration::from_millis(2500), &timing));
    }

    #[test]
    fn highlight_blinks_then_settles() {
        let timing = RenderTiming::default();
        let t0 = Instant::now();
        let h = WinHighlight::new(BTreeSet::from([1, 3]), t0);
        assert!(h.is_lit(t0, &timing));
        assert!(!h.is_lit(t0 + Duration::from_millis(350), &timing));
        assert!(h.is_lit(t0 + Duration::from_millis(650), &timing));
        assert_eq!(h.lit_rows(t0 + Duration::from_millis(5000), &timing).len(), 2);
    }
}
