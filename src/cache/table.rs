//! Scalar and vector memoization tables keyed by `(i, y)`.
//!
//! Index arithmetic mirrors the original `SemiCrf.cpp`: `idx = i * num_labels
//! + y`, capacity `num_labels * seq_len`. A table only ever grows forward in
//! `i` (the recursions recurse into smaller `i` before writing the current
//! one), so the "filled" flag is set strictly after the payload is written —
//! see §5 of the spec for why that ordering still matters to document even
//! single-threaded.

use crate::label::Label;
use crate::numeric::FeatureVec;

#[derive(Debug, Clone, Copy, Default)]
struct AlphaEntry {
    filled: bool,
    value: f64,
}

/// α(i, y) memoization, one slot per `(i, y)`. `α(-1, y)` is the implicit
/// base case and is never stored here.
pub struct AlphaTable {
    num_labels: usize,
    entries: Vec<AlphaEntry>,
}

impl AlphaTable {
    pub fn new(num_labels: usize, seq_len: usize) -> Self {
        Self {
            num_labels,
            entries: vec![AlphaEntry::default(); num_labels * seq_len],
        }
    }

    fn index(&self, i: usize, y: Label) -> usize {
        i * self.num_labels + y.as_usize()
    }

    pub fn get(&self, i: usize, y: Label) -> Option<f64> {
        let entry = &self.entries[self.index(i, y)];
        entry.filled.then_some(entry.value)
    }

    pub fn set(&mut self, i: usize, y: Label, value: f64) {
        let idx = self.index(i, y);
        let entry = &mut self.entries[idx];
        entry.value = value;
        entry.filled = true;
    }
}

#[derive(Debug, Clone, Default)]
struct EtaEntry {
    filled: bool,
    value: Option<FeatureVec>,
}

/// η(i, y) memoization: one shared dense vector per `(i, y)`.
///
/// Payloads are immutable once filled — callers that want to accumulate on
/// top of a stored vector clone it first (the original's `eta()` builds a
/// fresh `uvector` and installs it once, never mutating a cached one in
/// place). This keeps the driver's own working gradient buffer from ever
/// aliasing a table slot, per the design note in §9 of the spec.
pub struct EtaTable {
    num_labels: usize,
    entries: Vec<EtaEntry>,
}

impl EtaTable {
    pub fn new(num_labels: usize, seq_len: usize) -> Self {
        Self {
            num_labels,
            entries: vec![EtaEntry::default(); num_labels * seq_len],
        }
    }

    fn index(&self, i: usize, y: Label) -> usize {
        i * self.num_labels + y.as_usize()
    }

    pub fn get(&self, i: usize, y: Label) -> Option<&FeatureVec> {
        let entry = &self.entries[self.index(i, y)];
        if entry.filled {
            entry.value.as_ref()
        } else {
            None
        }
    }

    pub fn set(&mut self, i: usize, y: Label, value: FeatureVec) {
        let idx = self.index(i, y);
        let entry = &mut self.entries[idx];
        entry.value = Some(value);
        entry.filled = true;
    }
}

/// One Viterbi table entry: the best value plus the back-pointers that
/// achieve it (argmax duration, argmax previous label).
#[derive(Debug, Clone, Copy)]
pub struct VEntry {
    pub value: f64,
    pub duration: usize,
    pub prev_label: Label,
}

#[derive(Debug, Clone, Copy, Default)]
struct VSlot {
    filled: bool,
    entry: Option<VEntryRaw>,
}

#[derive(Debug, Clone, Copy)]
struct VEntryRaw {
    value: f64,
    duration: usize,
    prev_label: Label,
}

/// V(i, y) memoization with back-pointers, for Viterbi (§4.6).
pub struct VTable {
    num_labels: usize,
    entries: Vec<VSlot>,
}

impl VTable {
    pub fn new(num_labels: usize, seq_len: usize) -> Self {
        Self {
            num_labels,
            entries: vec![VSlot::default(); num_labels * seq_len],
        }
    }

    fn index(&self, i: usize, y: Label) -> usize {
        i * self.num_labels + y.as_usize()
    }

    pub fn get(&self, i: usize, y: Label) -> Option<VEntry> {
        let slot = &self.entries[self.index(i, y)];
        if slot.filled {
            slot.entry.map(|e| VEntry {
                value: e.value,
                duration: e.duration,
                prev_label: e.prev_label,
            })
        } else {
            None
        }
    }

    pub fn set(&mut self, i: usize, y: Label, value: f64, duration: usize, prev_label: Label) {
        let idx = self.index(i, y);
        let slot = &mut self.entries[idx];
        slot.entry = Some(VEntryRaw {
            value,
            duration,
            prev_label,
        });
        slot.filled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_table_round_trips() {
        let mut table = AlphaTable::new(2, 3);
        assert_eq!(table.get(0, Label::ZERO), None);
        table.set(0, Label::ZERO, 1.5);
        assert_eq!(table.get(0, Label::ZERO), Some(1.5));
        assert_eq!(table.get(0, Label::new(1)), None);
    }

    #[test]
    fn eta_table_round_trips() {
        let mut table = EtaTable::new(1, 2);
        assert!(table.get(1, Label::ZERO).is_none());
        table.set(1, Label::ZERO, FeatureVec::from_vec(vec![1.0, 2.0]));
        assert_eq!(
            table.get(1, Label::ZERO).unwrap().as_slice(),
            &[1.0, 2.0]
        );
    }

    #[test]
    fn v_table_round_trips() {
        let mut table = VTable::new(2, 2);
        table.set(1, Label::new(1), 3.0, 2, Label::ZERO);
        let entry = table.get(1, Label::new(1)).unwrap();
        assert_eq!(entry.value, 3.0);
        assert_eq!(entry.duration, 2);
        assert_eq!(entry.prev_label, Label::ZERO);
    }
}
