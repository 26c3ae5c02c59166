//! Randomness for grid generation.
//!
//! `SystemRandom` draws from the operating system's CSPRNG and degrades to a
//! time-seeded ChaCha stream if that source ever fails. `SeededRandom` is the
//! reproducible variant for tests and replays.

use rand::rngs::OsRng;
use rand::{Rng, SeedableRng, TryRngCore};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const U32_RANGE: f64 = 4_294_967_296.0;

static FALLBACK_LOGGED: AtomicBool = AtomicBool::new(false);

/// Source of uniform samples. Implementations must not panic.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Uniform integer in `[min, max]`, inclusive at both ends.
    /// Reversed bounds are swapped.
    fn int(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if lo == hi {
            return lo;
        }
        let span = (hi as i128 - lo as i128 + 1) as f64;
        let offset = (self.uniform() * span).floor() as i128;
        let offset = offset.clamp(0, hi as i128 - lo as i128);
        (lo as i128 + offset) as i64
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

/// Whether any `SystemRandom` in this process has fallen back to the weak generator.
pub fn fallback_active() -> bool {
    FALLBACK_LOGGED.load(Ordering::Relaxed)
}

fn note_fallback(reason: &dyn std::fmt::Display) {
    if !FALLBACK_LOGGED.swap(true, Ordering::Relaxed) {
        log::warn!("Secure random source unavailable ({reason}), falling back to ChaCha8");
    }
}

fn time_seed() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// Strong source first, weak PRNG once the strong one fails.
pub struct SystemRandom<S: TryRngCore = OsRng> {
    strong: Option<S>,
    weak: ChaCha8Rng,
}

impl SystemRandom<OsRng> {
    pub fn new() -> Self {
        Self::with_source(OsRng)
    }
}

impl Default for SystemRandom<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TryRngCore> SystemRandom<S> {
    /// Use `strong` as the preferred source.
    pub fn with_source(strong: S) -> Self {
        Self { strong: Some(strong), weak: ChaCha8Rng::seed_from_u64(time_seed()) }
    }

    /// True once this instance has switched to the weak generator.
    pub fn is_degraded(&self) -> bool {
        self.strong.is_none()
    }
}

impl<S: TryRngCore> std::fmt::Debug for SystemRandom<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRandom").field("degraded", &self.is_degraded()).finish()
    }
}

impl<S: TryRngCore> RandomSource for SystemRandom<S> {
    fn uniform(&mut self) -> f64 {
        if let Some(strong) = self.strong.as_mut() {
            match strong.try_next_u32() {
                Ok(v) => return f64::from(v) / U32_RANGE,
                Err(e) => {
                    note_fallback(&e);
                    self.strong = None;
                }
            }
        }
        self.weak.random::<f64>()
    }
}

/// Deterministic ChaCha8 stream.
///
/// ```
/// use slot_rs::rng::{RandomSource, SeededRandom};
///
/// let mut a = SeededRandom::new(42);
/// let mut b = SeededRandom::new(42);
/// assert_eq!(a.uniform(), b.uniform());
/// ```
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}
