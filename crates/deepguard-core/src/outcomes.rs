//! Synthetic outcome generation.
//!
//! All randomness in the pipelines goes through [`OutcomeGenerator`] so the
//! phase logic stays deterministic under test. Production code uses
//! [`RandomOutcomes`]; tests substitute [`SequenceOutcomes`].
//!
//! ```
//! use deepguard_core::outcomes::{OutcomeGenerator, SequenceOutcomes};
//!
//! let outcomes = SequenceOutcomes::new()
//!     .with_decisions([true, false])
//!     .with_ints([91]);
//!
//! assert!(outcomes.decide(0.7));
//! assert!(!outcomes.decide(0.7));
//! assert_eq!(outcomes.uniform_int(80, 100), 91);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;

/// Source of synthetic decisions.
pub trait OutcomeGenerator: Send + Sync {
    /// Return `true` with the given probability (clamped to `[0, 1]`).
    /// A NaN probability never succeeds.
    fn decide(&self, probability: f64) -> bool;

    /// Uniform integer in the half-open range `[lo, hi)`.
    ///
    /// Returns `lo` when the range is empty.
    fn uniform_int(&self, lo: i64, hi: i64) -> i64;
}

/// Shared handle to an outcome generator.
pub type SharedOutcomes = Arc<dyn OutcomeGenerator>;

/// Pick one element uniformly from a non-empty slice.
pub fn choose<'a, T>(outcomes: &dyn OutcomeGenerator, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = outcomes.uniform_int(0, items.len() as i64);
    items.get(idx as usize)
}

/// Thread-local RNG backed generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcomes;

impl RandomOutcomes {
    pub fn new() -> Self {
        Self
    }

    /// Convenience constructor for the shared form the pipelines take.
    pub fn shared() -> SharedOutcomes {
        Arc::new(Self)
    }
}

impl OutcomeGenerator for RandomOutcomes {
    fn decide(&self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
    }

    fn uniform_int(&self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        rand::thread_rng().gen_range(lo..hi)
    }
}

/// Deterministic generator replaying fixed sequences.
///
/// Decisions and integers cycle independently once exhausted. An empty
/// decision sequence always answers `false`; an empty integer sequence
/// always answers `lo`. Integers are clamped into the requested range so a
/// fixture can never push an item outside its invariants.
#[derive(Debug, Default)]
pub struct SequenceOutcomes {
    decisions: Vec<bool>,
    ints: Vec<i64>,
    decision_cursor: AtomicUsize,
    int_cursor: AtomicUsize,
}

impl SequenceOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decision sequence.
    pub fn with_decisions(mut self, decisions: impl IntoIterator<Item = bool>) -> Self {
        self.decisions = decisions.into_iter().collect();
        self
    }

    /// Set the integer sequence.
    pub fn with_ints(mut self, ints: impl IntoIterator<Item = i64>) -> Self {
        self.ints = ints.into_iter().collect();
        self
    }

    /// Wrap in the shared form the pipelines take.
    pub fn shared(self) -> SharedOutcomes {
        Arc::new(self)
    }

    /// Number of decisions consumed so far.
    pub fn decisions_drawn(&self) -> usize {
        self.decision_cursor.load(Ordering::SeqCst)
    }

    /// Number of integers consumed so far.
    pub fn ints_drawn(&self) -> usize {
        self.int_cursor.load(Ordering::SeqCst)
    }
}

impl OutcomeGenerator for SequenceOutcomes {
    fn decide(&self, _probability: f64) -> bool {
        if self.decisions.is_empty() {
            return false;
        }
        let n = self.decision_cursor.fetch_add(1, Ordering::SeqCst);
        self.decisions[n % self.decisions.len()]
    }

    fn uniform_int(&self, lo: i64, hi: i64) -> i64 {
        if hi <= lo || self.ints.is_empty() {
            return lo;
        }
        let n = self.int_cursor.fetch_add(1, Ordering::SeqCst);
        self.ints[n % self.ints.len()].clamp(lo, hi - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_uniform_int_stays_in_range() {
        let outcomes = RandomOutcomes::new();
        for _ in 0..1_000 {
            let v = outcomes.uniform_int(80, 100);
            assert!((80..100).contains(&v));
        }
    }

    #[test]
    fn test_random_decide_nan_never_succeeds() {
        let outcomes = RandomOutcomes::new();
        for _ in 0..100 {
            assert!(!outcomes.decide(f64::NAN));
        }
    }

    #[test]
    fn test_random_uniform_int_empty_range() {
        let outcomes = RandomOutcomes::new();
        assert_eq!(outcomes.uniform_int(5, 5), 5);
        assert_eq!(outcomes.uniform_int(7, 3), 7);
    }

    #[test]
    fn test_random_decide_extremes() {
        let outcomes = RandomOutcomes::new();
        assert!(outcomes.decide(1.0));
        assert!(!outcomes.decide(0.0));
        assert!(outcomes.decide(42.0));
        assert!(!outcomes.decide(-1.0));
    }

    #[test]
    fn test_sequence_cycles() {
        let outcomes = SequenceOutcomes::new()
            .with_decisions([true, false])
            .with_ints([1, 2]);
        assert!(outcomes.decide(0.5));
        assert!(!outcomes.decide(0.5));
        assert!(outcomes.decide(0.5));
        assert_eq!(outcomes.uniform_int(0, 10), 1);
        assert_eq!(outcomes.uniform_int(0, 10), 2);
        assert_eq!(outcomes.uniform_int(0, 10), 1);
        assert_eq!(outcomes.decisions_drawn(), 3);
        assert_eq!(outcomes.ints_drawn(), 3);
    }

    #[test]
    fn test_sequence_clamps_into_range() {
        let outcomes = SequenceOutcomes::new().with_ints([500, -3]);
        assert_eq!(outcomes.uniform_int(80, 100), 99);
        assert_eq!(outcomes.uniform_int(80, 100), 80);
    }

    #[test]
    fn test_sequence_empty_defaults() {
        let outcomes = SequenceOutcomes::new();
        assert!(!outcomes.decide(1.0));
        assert_eq!(outcomes.uniform_int(3, 9), 3);
    }

    #[test]
    fn test_choose() {
        let outcomes = SequenceOutcomes::new().with_ints([2]);
        let items = ["a", "b", "c", "d"];
        assert_eq!(choose(&outcomes, &items), Some(&"c"));
        let empty: [&str; 0] = [];
        assert_eq!(choose(&outcomes, &empty), None);
    }
}
