//! Direct-mapped WG cache (§4.2).
//!
//! Keyed by the composite index `y*L*S*maxLength + y_prev*S*maxLength +
//! i*maxLength + d - 1` (ported verbatim from `Algorithm::computeWG` in the
//! original `SemiCrf.cpp`), slot `idx mod capacity`. A slot is valid only if
//! its stored key matches the lookup key; eviction on collision is a silent
//! overwrite, no chaining.

use crate::numeric::FeatureVec;

#[derive(Debug, Clone)]
struct Slot {
    key: Option<usize>,
    score: f64,
    gradient: FeatureVec,
}

/// Default capacity: large enough that typical sequences see a hit rate
/// above 50%, per §4.2 — the exact value is a tunable, not a spec'd
/// constant (§9's "free constant" design note).
pub const DEFAULT_CAPACITY: usize = 1 << 16;

pub struct WgCache {
    capacity: usize,
    slots: Vec<Slot>,
    hits: u64,
    misses: u64,
}

impl WgCache {
    pub fn new(capacity: usize, dim: usize) -> Self {
        Self {
            capacity,
            slots: vec![
                Slot {
                    key: None,
                    score: 0.0,
                    gradient: FeatureVec::zeros(dim),
                };
                capacity
            ],
            hits: 0,
            misses: 0,
        }
    }

    /// Composite key for `(y, y_prev, i, d)` given the label count, sequence
    /// length, and max segment duration.
    pub fn key(
        num_labels: usize,
        seq_len: usize,
        max_length: usize,
        y: usize,
        y_prev: usize,
        i: usize,
        d: usize,
    ) -> usize {
        y * num_labels * seq_len * max_length
            + y_prev * seq_len * max_length
            + i * max_length
            + d
            - 1
    }

    /// Look up `key`; returns `Some((score, gradient))` on a hit.
    pub fn get(&mut self, key: usize) -> Option<(f64, FeatureVec)> {
        let slot = &self.slots[key % self.capacity];
        if slot.key == Some(key) {
            self.hits += 1;
            Some((slot.score, slot.gradient.clone()))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Install a freshly computed score/gradient pair, silently evicting
    /// whatever was in that slot before.
    pub fn install(&mut self, key: usize, score: f64, gradient: FeatureVec) {
        let slot = &mut self.slots[key % self.capacity];
        slot.key = Some(key);
        slot.score = score;
        slot.gradient = gradient;
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
