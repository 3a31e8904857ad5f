//! Approximate distinct-value counter, used only to pick a column sort
//! order before the row sort (spec.md §4.E step 3, §9).
//!
//! Exact below [`EXACT_THRESHOLD`] distinct values, falling back to a
//! small HyperLogLog-style sketch above it — spec.md §9 explicitly names
//! this combination as an acceptable implementation choice. Neither the
//! teacher nor the rest of the pack carries a ready-made HLL crate, so
//! this is a small hand-rolled sketch rather than an imported one.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

const EXACT_THRESHOLD: usize = 4096;
const REGISTER_BITS: u32 = 10; // 1024 registers
const NUM_REGISTERS: usize = 1 << REGISTER_BITS;

/// Ascending-by-cardinality sort key for a column: either an exact count
/// or a HyperLogLog estimate once the exact set grows past the threshold.
pub struct CardinalityEstimator {
    exact: Option<HashSet<u64>>,
    registers: Vec<u8>,
}

impl Default for CardinalityEstimator {
    fn default() -> Self {
        CardinalityEstimator {
            exact: Some(HashSet::new()),
            registers: Vec::new(),
        }
    }
}

impl CardinalityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: &str) {
        let hash = hash64(value);
        if let Some(exact) = &mut self.exact {
            exact.insert(hash);
            if exact.len() > EXACT_THRESHOLD {
                self.registers = vec![0u8; NUM_REGISTERS];
                for h in exact.iter() {
                    Self::register(&mut self.registers, *h);
                }
                self.exact = None;
            }
            return;
        }
        Self::register(&mut self.registers, hash);
    }

    fn register(registers: &mut [u8], hash: u64) {
        let idx = (hash & (NUM_REGISTERS as u64 - 1)) as usize;
        let rest = hash >> REGISTER_BITS;
        let rank = (rest.trailing_zeros() + 1).min(64) as u8;
        if rank > registers[idx] {
            registers[idx] = rank;
        }
    }

    /// Estimated number of distinct values observed so far.
    pub fn estimate(&self) -> u64 {
        match &self.exact {
            Some(set) => set.len() as u64,
            None => {
                let m = NUM_REGISTERS as f64;
                let sum: f64 = self
                    .registers
                    .iter()
                    .map(|&r| 2f64.powi(-(r as i32)))
                    .sum();
                let alpha = 0.7213 / (1.0 + 1.079 / m);
                (alpha * m * m / sum).round() as u64
            }
        }
    }
}

fn hash64(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod cardinality_test {
    use super::*;

    #[test]
    fn exact_count_is_precise() {
        let mut est = CardinalityEstimator::new();
        for v in ["a", "b", "c", "a", "b"] {
            est.observe(v);
        }
        assert_eq!(est.estimate(), 3);
    }

    #[test]
    fn estimate_is_in_the_right_ballpark_past_threshold() {
        let mut est = CardinalityEstimator::new();
        for i in 0..20_000 {
            est.observe(&i.to_string());
        }
        let got = est.estimate() as f64;
        assert!(got > 10_000.0 && got < 40_000.0, "estimate was {}", got);
    }
}
