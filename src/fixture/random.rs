use std::cell::Cell;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of randomness for fixture generation and error injection.
pub trait RandomSource {
    /// Returns a value in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;

    /// Returns a value in `[0, bound)`, or `0` when `bound` is `0`.
    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        ((self.next_f64() * bound as f64) as u64).min(bound - 1)
    }
}

/// [`RandomSource`] backed by rand's `StdRng`.
pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}
impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.0.gen_range(0..bound) }
    }
}

/// [`RandomSource`] that cycles through a fixed list of values.
///
/// Values are clamped into `[0.0, 1.0)`. An empty list always yields `0.0`.
pub struct SequenceRandom {
    values: Vec<f64>,
    index: usize,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect(),
            index: 0,
        }
    }
}
impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index = self.index.wrapping_add(1);
        value
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock(Cell<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Cell::new(now))
    }
    pub fn set(&self, now: DateTime<Utc>) {
        self.0.set(now);
    }
}
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}
impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
